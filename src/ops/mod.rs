pub mod archive_ops;
pub mod check;
pub mod id_gen;
pub mod list_ops;
pub mod task_ops;
pub mod task_tree;
