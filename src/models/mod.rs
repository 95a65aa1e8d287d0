mod link;

pub use link::{
    ClickAnalytics, CreateLinkRequest, ErrorResponse, Link, MessageResponse, NewLink,
    ShortenedLink,
};
