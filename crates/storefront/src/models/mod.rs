//! Content models for the storefront database.
//!
//! These are the only first-party persisted entities; products, carts,
//! orders and customers belong to the commerce backend.
//!
//! Each record has a read type (returned by the API as camelCase JSON) and a
//! `New*` input type used when upserting seed content.

pub mod blog;
pub mod hero_slide;
pub mod offer;
pub mod testimonial;

pub use blog::{Blog, NewBlog};
pub use hero_slide::{HeroSlide, NewHeroSlide};
pub use offer::{NewOffer, Offer};
pub use testimonial::{NewTestimonial, Testimonial};
