use crate::model::id::AuditoriumId;
use derive_new::new;

#[derive(Debug, new)]
pub struct CreateAuditorium {
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, new)]
pub struct UpdateAuditorium {
    pub auditorium_id: AuditoriumId,
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
}
