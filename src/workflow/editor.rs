use serde::Serialize;

use super::access::require_permission;
use crate::error::Result;
use crate::types::{Permission, User};

/// Echo of a digital editor draft. Drafts are not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct EditorDraft {
    pub title: String,
    pub content: String,
    pub saved: bool,
}

pub fn draft(actor: &User, title: &str, content: &str) -> Result<EditorDraft> {
    require_permission(actor, Permission::DIGITAL_EDITOR)?;
    tracing::debug!(actor = %actor.username, chars = content.len(), "Editor draft received");
    Ok(EditorDraft {
        title: title.to_string(),
        content: content.to_string(),
        saved: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::workflow::testing::{TestEnv, regular};

    #[test]
    fn test_draft_requires_editor_capability() {
        let env = TestEnv::new();
        let clerk = regular(&env, "clerk");
        assert!(matches!(
            draft(&clerk, "t", "c"),
            Err(Error::PermissionDenied)
        ));

        let mut editor = clerk.clone();
        editor.permissions = editor.permissions.union(Permission::DIGITAL_EDITOR);
        let echoed = draft(&editor, "Memo", "Body").unwrap();
        assert_eq!(echoed.title, "Memo");
        assert_eq!(echoed.content, "Body");
        assert!(echoed.saved);
    }
}
