use crate::model::id::AuditoriumId;

pub mod event;

#[derive(Debug)]
pub struct Auditorium {
    pub auditorium_id: AuditoriumId,
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    // オブジェクトストレージ上のキー。URL ではない
    pub image_key: Option<String>,
    pub video_key: Option<String>,
}
