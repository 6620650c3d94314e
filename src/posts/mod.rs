pub mod draft;
pub mod interactions;
pub mod share;

pub use draft::{compose, revise, Draft};
pub use interactions::{
    delete_post, toggle_like, toggle_save, Actor, Deletion, InteractionError, LikeState, SaveState,
};
pub use share::ShareLinks;
