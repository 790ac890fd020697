use derive_new::new;
use garde::Validate;
use kernel::model::{
    auditorium::{
        event::{CreateAuditorium, UpdateAuditorium},
        Auditorium,
    },
    id::AuditoriumId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditoriumRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(range(min = 1))]
    pub capacity: i32,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub location: Option<String>,
    #[garde(skip)]
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

impl From<CreateAuditoriumRequest> for CreateAuditorium {
    fn from(value: CreateAuditoriumRequest) -> Self {
        let CreateAuditoriumRequest {
            name,
            capacity,
            description,
            location,
            is_active,
        } = value;
        CreateAuditorium {
            name,
            capacity,
            description,
            location,
            is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuditoriumRequest {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(range(min = 1))]
    pub capacity: i32,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub location: Option<String>,
    #[garde(skip)]
    pub is_active: bool,
}

#[derive(new)]
pub struct UpdateAuditoriumRequestWithId(AuditoriumId, UpdateAuditoriumRequest);

impl From<UpdateAuditoriumRequestWithId> for UpdateAuditorium {
    fn from(value: UpdateAuditoriumRequestWithId) -> Self {
        let UpdateAuditoriumRequestWithId(
            auditorium_id,
            UpdateAuditoriumRequest {
                name,
                capacity,
                description,
                location,
                is_active,
            },
        ) = value;
        UpdateAuditorium {
            auditorium_id,
            name,
            capacity,
            description,
            location,
            is_active,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditoriumsResponse {
    pub items: Vec<AuditoriumResponse>,
}

impl From<Vec<Auditorium>> for AuditoriumsResponse {
    fn from(value: Vec<Auditorium>) -> Self {
        Self {
            items: value.into_iter().map(AuditoriumResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditoriumResponse {
    pub auditorium_id: AuditoriumId,
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub image_key: Option<String>,
    pub video_key: Option<String>,
}

impl From<Auditorium> for AuditoriumResponse {
    fn from(value: Auditorium) -> Self {
        let Auditorium {
            auditorium_id,
            name,
            capacity,
            description,
            location,
            is_active,
            image_key,
            video_key,
        } = value;
        Self {
            auditorium_id,
            name,
            capacity,
            description,
            location,
            is_active,
            image_key,
            video_key,
        }
    }
}
