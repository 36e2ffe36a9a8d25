mod header;
mod new_task_bar;
mod permission_banner;
mod task_item;
mod task_section;

pub use header::Header;
pub use new_task_bar::{
  NewTaskBar,
  can_submit
};
pub use permission_banner::PermissionBanner;
pub use task_item::TaskItem;
pub use task_section::TaskSection;
