//! Form validation shared by the composer, the profile screens and the
//! auth forms. Nothing in here touches the database.

/// Largest accepted image upload (avatars and post images).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.message())]
pub enum ValidationError {
    EmptyContent,
    ContentTooShort,
    ContentTooLong,
    UnknownCategory,
    MissingCategory,
    NotAnImage,
    ImageTooLarge,
    FullNameRequired,
    FullNameTooShort,
    PhoneRequired,
    PhoneInvalid,
    EmailRequired,
    EmailInvalid,
    PasswordRequired,
    PasswordTooShort,
    PasswordMismatch,
    TermsNotAccepted,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::EmptyContent => "الرجاء كتابة الخاطرة أولاً",
            ValidationError::ContentTooShort => "الخاطرة يجب أن تكون على الأقل 10 أحرف",
            ValidationError::ContentTooLong => "الخاطرة يجب ألا تتجاوز 500 حرف",
            ValidationError::UnknownCategory => "التصنيف المختار غير موجود",
            ValidationError::MissingCategory => "يرجى اختيار تصنيف للخاطرة",
            ValidationError::NotAnImage => "الرجاء اختيار صورة فقط",
            ValidationError::ImageTooLarge => "حجم الصورة يجب أن يكون أقل من 5MB",
            ValidationError::FullNameRequired => "الاسم الكامل مطلوب",
            ValidationError::FullNameTooShort => "الاسم يجب أن يكون حرفين على الأقل",
            ValidationError::PhoneRequired => "رقم الموبايل مطلوب",
            ValidationError::PhoneInvalid => "رقم الموبايل غير صحيح",
            ValidationError::EmailRequired => "البريد الإلكتروني مطلوب",
            ValidationError::EmailInvalid => "البريد الإلكتروني غير صحيح",
            ValidationError::PasswordRequired => "كلمة المرور مطلوبة",
            ValidationError::PasswordTooShort => "كلمة المرور يجب أن تكون 6 أحرف على الأقل",
            ValidationError::PasswordMismatch => "كلمات المرور غير متطابقة",
            ValidationError::TermsNotAccepted => "يجب الموافقة على الشروط والأحكام",
        }
    }
}

/// Image types accepted for upload, with the extension they are stored under.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// An uploaded file as received from a multipart form. The client's file
/// name is not kept: stored objects are named from the content type alone.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.extension()?;
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge);
        }
        Ok(())
    }

    /// Extension for the stored object. Only raster types on the allow-list
    /// have one; anything else (svg included) is not an image here.
    pub fn extension(&self) -> Result<&'static str, ValidationError> {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        IMAGE_TYPES
            .iter()
            .find(|(mime, _)| *mime == essence)
            .map(|(_, ext)| *ext)
            .ok_or(ValidationError::NotAnImage)
    }
}

/// Loose `something@something.something` check, the same shape the
/// registration form has always accepted.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Egyptian mobile numbers: `01` then one of `0 1 2 5`, then eight digits.
pub fn is_valid_mobile(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    bytes.len() == 11
        && bytes.iter().all(u8::is_ascii_digit)
        && bytes.starts_with(b"01")
        && matches!(bytes[2], b'0' | b'1' | b'2' | b'5')
}
