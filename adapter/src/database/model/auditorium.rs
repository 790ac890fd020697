use kernel::model::{auditorium::Auditorium, id::AuditoriumId};

#[derive(sqlx::FromRow)]
pub struct AuditoriumRow {
    pub auditorium_id: AuditoriumId,
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub image_key: Option<String>,
    pub video_key: Option<String>,
}

impl From<AuditoriumRow> for Auditorium {
    fn from(value: AuditoriumRow) -> Self {
        let AuditoriumRow {
            auditorium_id,
            name,
            capacity,
            description,
            location,
            is_active,
            image_key,
            video_key,
        } = value;
        Auditorium {
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
