//! # TUI Components
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! - `TitleBar`: connection state, status line, unseen-content marker
//! - `MessageView`: one conversation line, styled by origin
//!
//! ### Stateful Components (Event-Driven)
//!
//! - `InputBox`: query editor, dimmed while sends are gated
//! - `MessageList`: scrollable conversation with layout caching and the
//!   typing indicator
//!
//! Components receive external data as props, never by reaching into the
//! session view directly:
//!
//! ```rust,ignore
//! TitleBar::new(view.state, view.status.clone(), unseen).render(frame, area);
//! ```
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (top status bar)
//! ├── message.rs       (single message renderer)
//! ├── message_list.rs  (scrollable message container)
//! └── input_box/       (query editor)
//! ```

pub mod input_box;
pub mod message;
pub mod message_list;
mod title_bar;

pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
