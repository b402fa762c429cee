//! Blocks
//!
//! A note is an ordered list of blocks. Blocks have no version of their own, the note's version
//! governs all of its blocks as a unit.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Block types
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    /// Plain text
    #[default]
    Paragraph,

    /// Heading
    Heading,

    /// Bulleted list item
    Bullet,

    /// Checkbox list item, the only type that carries `checked`
    Checkbox,

    /// Code
    Code,
}

impl BlockType {
    /// Name as used in storage and on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Bullet => "bullet",
            Self::Checkbox => "checkbox",
            Self::Code => "code",
        }
    }
}

/// A persisted block
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block ID
    pub id: Uuid,

    /// Type of the block
    #[serde(rename = "type")]
    pub block_type: BlockType,

    /// Free-text content
    pub content: String,

    /// Checked state, always `false` for anything but checkboxes
    pub checked: bool,

    /// Dense, zero-based position within the note
    pub position: i32,
}

impl Block {
    /// Same visible content, ignoring identity and position
    pub fn same_content(&self, other: &Self) -> bool {
        self.block_type == other.block_type
            && self.content == other.content
            && self.checked == other.checked
    }
}

/// A block as supplied by a caller
///
/// Everything is optional, missing fields get their defaults when materialized
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDraft {
    /// Client-chosen ID, a fresh one is assigned when absent
    pub id: Option<Uuid>,

    /// Type of the block, defaults to a paragraph
    #[serde(rename = "type")]
    pub block_type: Option<BlockType>,

    /// Content, defaults to an empty string
    pub content: Option<String>,

    /// Checked state, only kept for checkboxes
    pub checked: Option<bool>,
}

impl BlockDraft {
    /// Draft for a paragraph with the given content
    pub fn paragraph<C: Into<String>>(content: C) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

impl From<&Block> for BlockDraft {
    fn from(block: &Block) -> Self {
        Self {
            id: Some(block.id),
            block_type: Some(block.block_type),
            content: Some(block.content.clone()),
            checked: Some(block.checked),
        }
    }
}

/// A block list was not acceptable
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    /// The same ID was used for more than one block
    #[error("Duplicate block id: {0}")]
    DuplicateId(Uuid),
}

/// Turn drafts into blocks
///
/// Order equals array position, defaults are applied and `checked` is dropped for anything that
/// is not a checkbox.
pub fn materialize(drafts: &[BlockDraft]) -> Result<Vec<Block>, BlockError> {
    let mut seen = HashSet::with_capacity(drafts.len());

    drafts
        .iter()
        .enumerate()
        .map(|(index, draft)| {
            let id = draft.id.unwrap_or_else(Uuid::new_v4);

            if !seen.insert(id) {
                return Err(BlockError::DuplicateId(id));
            }

            let block_type = draft.block_type.unwrap_or_default();

            Ok(Block {
                id,
                block_type,
                content: draft.content.clone().unwrap_or_default(),
                checked: block_type == BlockType::Checkbox && draft.checked.unwrap_or(false),
                position: i32::try_from(index).unwrap_or(i32::MAX),
            })
        })
        .collect()
}

/// The block list of a brand new note without caller-supplied blocks
pub fn default_blocks() -> Vec<Block> {
    vec![Block {
        id: Uuid::new_v4(),
        block_type: BlockType::Paragraph,
        content: String::new(),
        checked: false,
        position: 0,
    }]
}

/// Do both lists show the same content in the same order?
pub fn same_content(left: &[Block], right: &[Block]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(left, right)| left.same_content(right))
}
