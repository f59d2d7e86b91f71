mod engine;
mod tree;

pub use engine::{translate_unit, TranslationError};
pub use tree::{
    atomic_write_file, output_rel_path, should_translate, translate_file, translate_path,
    translate_reader, translate_tree,
};
