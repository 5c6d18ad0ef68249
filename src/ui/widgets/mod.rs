mod input_field;
mod list;
mod message_panel;

pub use input_field::{draw_field, render_input_field};
pub use list::{draw_buttons, draw_list};
pub use message_panel::draw_message_panel;
