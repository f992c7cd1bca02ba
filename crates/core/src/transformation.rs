//! Block/Code transformation model and script assembly.
//!
//! A transformation is an ordered list of named blocks, each holding
//! ordered named codes, each holding raw script lines. The packaged
//! artifact is the flat concatenation of every line in document order.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A named group of [`Code`] fragments.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Block {
    /// Block name from the configuration tree.
    #[validate(length(min = 1, message = "block name must not be empty"))]
    pub name: String,
    /// Ordered code fragments in this block.
    #[validate(length(min = 1, message = "block must contain at least one code"), nested)]
    pub codes: Vec<Code>,
}

/// A named fragment holding raw script lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Code {
    /// Code name from the configuration tree.
    #[validate(length(min = 1, message = "code name must not be empty"))]
    pub name: String,
    /// Raw script lines, concatenated verbatim into the artifact.
    pub script: Vec<String>,
}

/// Assemble the single executable script from the block tree.
///
/// Concatenates every line of every code of every block in document
/// order. No separator is inserted beyond what each line already
/// contains, and lines are never reordered or deduplicated.
pub fn assemble_script(blocks: &[Block]) -> String {
    let mut script = String::new();
    for block in blocks {
        for code in &block.codes {
            for line in &code.script {
                script.push_str(line);
            }
        }
    }
    script
}
