pub const MAX_NAME_LEN: usize = 200;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_SERVICE_LEN: usize = 200;
pub const MAX_BOOKINGS: usize = 10_000;

pub const MAX_GALLERY_IMAGES: usize = 1_000;
pub const MAX_IMAGE_URL_LEN: usize = 2_048;
pub const MAX_IMAGE_ALT_LEN: usize = 500;

/// Store keys are file names, so keep them short.
pub const MAX_STORE_KEY_LEN: usize = 64;
