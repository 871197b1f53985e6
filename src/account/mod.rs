//! Account module — credential lifecycle operations over pluggable
//! collaborators (credential store, revocation store, mail sender).

pub mod actor;
pub mod types;

pub use actor::{AccountActor, AccountHandle};
pub use types::{
    ChangePasswordRequest, Locale, NewUser, ResetState, SignInRequest, SignUpRequest,
    UpdateProfileRequest, User, VerificationState,
};
