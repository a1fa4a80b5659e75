mod crypto;
mod db;
mod extractor;

pub use crypto::{hash_password, verify_password};
pub use db::{
    create_session, create_user, delete_session, find_by_email, password_hash, set_avatar,
    set_password_hash, username_taken,
};
pub use extractor::{bearer_token, AuthUser, MaybeAuthUser};
