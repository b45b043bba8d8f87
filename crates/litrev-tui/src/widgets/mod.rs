//! Widgets for the review screens

pub mod input_box;
pub mod markdown;
pub mod message_list;
pub mod paper_list;
pub mod progress;
pub mod selector;
pub mod spinner;

pub use input_box::InputBox;
pub use message_list::MessageList;
pub use paper_list::{PaperList, PapersView};
pub use progress::{FailureCard, ProgressCard, SummaryCard};
pub use selector::{Selector, SelectorItem, SelectorState};
pub use spinner::Spinner;
