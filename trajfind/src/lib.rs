pub mod commands;
pub mod handlers;

pub use commands::{CLAP_STYLING, command_argument_builder};
pub use handlers::{
    apply_overrides, handle_locate, handle_scan, handle_validate, load_config, load_graph_snapshot,
    snapshot_probe,
};
