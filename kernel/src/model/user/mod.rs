// kernel/src/model/user/mod.rs
use crate::model::{id::UserId, role::Role};

pub mod event;

// パスワードハッシュは外に出さないため、このモデルには含めない
#[derive(Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub dni: String,
    pub university_code: String,
    pub role: Role,
    // 以下は ESTUDIANTE のみ意味を持つ
    pub cycle: Option<i32>,
    pub group: Option<String>,
    pub program: Option<String>,
}

// メールアドレスの生成。nombre.apellido 形式
// （小文字化・アクセント除去・英字以外の除去）
pub fn derive_email(first_name: &str, last_name: &str) -> String {
    format!(
        "{}.{}",
        normalize_name_part(first_name),
        normalize_name_part(last_name)
    )
}

fn normalize_name_part(part: &str) -> String {
    part.trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' => Some('u'),
            'ñ' => Some('n'),
            'a'..='z' => Some(c),
            _ => None,
        })
        .collect()
}

// DNI は 8 桁の数字
pub fn is_valid_dni(dni: &str) -> bool {
    dni.len() == 8 && dni.chars().all(|c| c.is_ascii_digit())
}

// 大学コードは 9 桁の数字
pub fn is_valid_university_code(code: &str) -> bool {
    code.len() == 9 && code.chars().all(|c| c.is_ascii_digit())
}
