pub mod atomic;
pub mod copy;
pub mod meta;
pub mod paths;

pub use atomic::{create_symlink, fsync_parent_dir};
pub use copy::{copy_entry, move_entry, remove_entry};
pub use meta::{
    is_symlink, kind_following, kind_of, link_text_for, resolve_symlink_target, same_location, sha256_hex_of,
    PathKind,
};
pub use paths::{label_for, normalize, relative_link_text};
