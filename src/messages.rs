//! User-facing text.
//!
//! Every failure reported by the auth or data layer is turned into one of
//! these strings before it reaches a page or a notification. Auth errors are
//! matched on substrings of their message, anything unmatched falls back to a
//! generic string for the screen it happened on.

pub const GENERIC_ERROR: &str = "حدث خطأ غير متوقع";
pub const NOT_FOUND: &str = "الصفحة غير موجودة";
pub const UNAUTHORIZED: &str = "ليس لديك صلاحية للوصول إلى هذه الصفحة";

// Login
pub const INVALID_CREDENTIALS: &str = "البريد الإلكتروني أو كلمة المرور غير صحيحة";
pub const EMAIL_NOT_CONFIRMED: &str = "يرجى تأكيد بريدك الإلكتروني أولاً";
pub const LOGIN_FAILED: &str = "حدث خطأ أثناء تسجيل الدخول";
pub const EMAIL_REQUIRED_FOR_RESET: &str = "يرجى إدخال البريد الإلكتروني أولاً";
pub const RESET_LINK_SENT: &str = "تم إرسال رابط إعادة تعيين كلمة المرور إلى بريدك الإلكتروني";
pub const RESET_LINK_FAILED: &str = "حدث خطأ أثناء إرسال رابط إعادة التعيين";
pub const PASSWORD_UPDATED: &str = "تم تحديث كلمة المرور بنجاح";
pub const PASSWORD_UPDATE_FAILED: &str = "حدث خطأ أثناء تحديث كلمة المرور";

// Registration
pub const ALREADY_REGISTERED: &str = "هذا البريد الإلكتروني مسجل بالفعل";
pub const REGISTER_FAILED: &str = "حدث خطأ أثناء إنشاء الحساب";
pub const REGISTERED: &str =
    "تم إنشاء الحساب بنجاح! يرجى التحقق من بريدك الإلكتروني لتأكيد الحساب.";

// Email confirmation callback
pub const CALLBACK_PENDING: &str = "جاري التحقق من رابط التفعيل...";
pub const CALLBACK_MISSING_CODE: &str = "كود التفعيل مطلوب";
pub const CALLBACK_INVALID_LINK: &str = "رابط التفعيل غير صالح أو منتهي الصلاحية";
pub const CALLBACK_FAILED: &str = "حدث خطأ في التفعيل. يمكنك تسجيل الدخول يدوياً.";
pub const CALLBACK_CONFIRMED: &str = "تم تفعيل حسابك بنجاح! جاري توجيهك...";

// Posts
pub const POST_PUBLISHED: &str = "تم نشر الخاطرة بنجاح!";
pub const POST_PUBLISH_FAILED: &str = "حدث خطأ أثناء نشر الخاطرة";
pub const POST_UPDATED: &str = "تم تحديث الخاطرة بنجاح";
pub const POST_UPDATE_FAILED: &str = "حدث خطأ أثناء تحديث الخاطرة";
pub const POST_DELETED: &str = "تم حذف الخاطرة بنجاح";
pub const POST_DELETED_AS_MODERATOR: &str = "تم حذف الخاطرة كمشرف";
pub const POST_DELETE_FAILED: &str = "حدث خطأ أثناء حذف الخاطرة";
pub const IMAGE_UPLOAD_FAILED: &str = "فشل في رفع الصورة";
pub const LOGIN_TO_LIKE: &str = "يجب تسجيل الدخول للإعجاب بالخواطر";
pub const LOGIN_TO_SAVE: &str = "يجب تسجيل الدخول لحفظ الخواطر";
pub const LIKE_FAILED: &str = "حدث خطأ أثناء تحديث الإعجاب";
pub const SAVE_FAILED: &str = "حدث خطأ أثناء حفظ الخاطرة";
pub const SAVED: &str = "تم حفظ الخاطرة بنجاح";
pub const UNSAVED: &str = "تم إزالة الخاطرة من المحفوظات";
pub const UNSAVE_FAILED: &str = "حدث خطأ أثناء إزالة الخاطرة";
pub const NO_EDIT_PERMISSION: &str = "ليس لديك صلاحية لتعديل هذه الخاطرة";
pub const NO_DELETE_PERMISSION: &str = "ليس لديك صلاحية لحذف هذه الخاطرة";
pub const ANONYMOUS_AUTHOR: &str = "مستخدم مجهول";

// Profile
pub const PROFILE_SAVED: &str = "تم حفظ البيانات بنجاح!";
pub const PROFILE_UPDATED: &str = "تم تحديث الملف الشخصي بنجاح!";
pub const PROFILE_UPDATE_FAILED: &str = "حدث خطأ أثناء تحديث الملف الشخصي";
pub const AVATAR_UPDATED: &str = "تم تحديث الصورة الشخصية بنجاح!";
pub const AVATAR_FAILED: &str = "حدث خطأ أثناء رفع الصورة";
pub const SIGNED_OUT: &str = "تم تسجيل الخروج";

/// Message shown on the login form for a failed sign-in.
pub fn login_error(raw: &str) -> &'static str {
    if raw.contains("Invalid login credentials") {
        INVALID_CREDENTIALS
    } else if raw.contains("Email not confirmed") {
        EMAIL_NOT_CONFIRMED
    } else {
        LOGIN_FAILED
    }
}

/// Message shown on the registration form for a failed sign-up.
pub fn register_error(raw: &str) -> &'static str {
    if raw.contains("User already registered") {
        ALREADY_REGISTERED
    } else {
        REGISTER_FAILED
    }
}

/// Message shown when an email-confirmation link cannot be used.
pub fn callback_error(raw: &str) -> &'static str {
    if raw.contains("invalid or has expired") {
        CALLBACK_INVALID_LINK
    } else if raw.contains("code is required") {
        CALLBACK_MISSING_CODE
    } else {
        CALLBACK_FAILED
    }
}

/// Message shown when updating a password fails.
pub fn password_error(raw: &str) -> &'static str {
    if raw.contains("at least 6 characters") {
        crate::validation::ValidationError::PasswordTooShort.message()
    } else if raw.contains("session missing") {
        CALLBACK_INVALID_LINK
    } else {
        PASSWORD_UPDATE_FAILED
    }
}
