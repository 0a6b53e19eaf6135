mod word_list;

pub use word_list::*;

use async_trait::async_trait;

use crate::{Moderation, ModerationCategory};

/// Moderation that lets everything through
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl Moderation for AllowAll {
    async fn is_allowed(&self, _text: &str, _category: ModerationCategory) -> bool {
        true
    }
}
