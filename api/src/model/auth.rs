use garde::Validate;
use serde::Deserialize;

// email は nombre.apellido 形式、パスワードは DNI
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[garde(length(min = 1))]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}
