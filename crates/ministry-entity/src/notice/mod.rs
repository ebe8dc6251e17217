//! Notice domain entities.

pub mod category;
pub mod filter;
pub mod model;
pub mod priority;

pub use category::{NoticeCategory, NoticeClass};
pub use filter::NoticeFilter;
pub use model::{NewNotice, Notice, Recipient};
pub use priority::PriorityLevel;
