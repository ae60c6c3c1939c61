use chrono::Utc;
use uuid::Uuid;

use super::access::require_permission;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Permission, ReportTemplate, User};

fn insert(store: &dyn Store, name: &str, content: String) -> Result<ReportTemplate> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("template name cannot be empty".to_string()));
    }

    let template = ReportTemplate {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        content,
        created_at: Utc::now(),
    };
    store.create_template(&template)?;
    tracing::info!(template = %template.name, "Created report template");
    Ok(template)
}

pub fn add_template(
    store: &dyn Store,
    actor: &User,
    name: &str,
    content: &str,
) -> Result<ReportTemplate> {
    require_permission(actor, Permission::MANAGE_TEMPLATES)?;
    insert(store, name, content.to_string())
}

/// Create a template from an uploaded file. The file must be non-empty UTF-8.
pub fn import_template(
    store: &dyn Store,
    actor: &User,
    name: &str,
    file: Vec<u8>,
) -> Result<ReportTemplate> {
    require_permission(actor, Permission::MANAGE_TEMPLATES)?;

    let content = String::from_utf8(file)
        .map_err(|e| Error::ImportError(format!("template file is not valid UTF-8: {e}")))?;

    insert(store, name, content)
}

pub fn list_templates(store: &dyn Store, actor: &User) -> Result<Vec<ReportTemplate>> {
    require_permission(actor, Permission::MANAGE_TEMPLATES)?;
    store.list_templates()
}

pub fn get_template(store: &dyn Store, actor: &User, id: &str) -> Result<ReportTemplate> {
    require_permission(actor, Permission::MANAGE_TEMPLATES)?;
    store.get_template(id)?.ok_or(Error::NotFound)
}

pub fn delete_template(store: &dyn Store, actor: &User, id: &str) -> Result<()> {
    require_permission(actor, Permission::MANAGE_TEMPLATES)?;
    if !store.delete_template(id)? {
        return Err(Error::NotFound);
    }
    tracing::info!(template = %id, "Deleted report template");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::testing::{TestEnv, regular};

    #[test]
    fn test_add_and_list() {
        let env = TestEnv::new();

        add_template(env.store(), &env.admin, "Patrol", "Route: ...").unwrap();
        let created = add_template(env.store(), &env.admin, " Incident ", "What: ...").unwrap();
        assert_eq!(created.name, "Incident");

        let all = list_templates(env.store(), &env.admin).unwrap();
        assert_eq!(all.len(), 2);
        let fetched = get_template(env.store(), &env.admin, &created.id).unwrap();
        assert_eq!(fetched.content, "What: ...");
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let env = TestEnv::new();
        add_template(env.store(), &env.admin, "Patrol", "a").unwrap();
        assert!(matches!(
            add_template(env.store(), &env.admin, "Patrol", "b"),
            Err(Error::DuplicateTemplateName)
        ));
    }

    #[test]
    fn test_requires_capability() {
        let env = TestEnv::new();
        let clerk = regular(&env, "clerk");

        assert!(matches!(
            add_template(env.store(), &clerk, "Patrol", "a"),
            Err(Error::PermissionDenied)
        ));
        assert!(matches!(
            list_templates(env.store(), &clerk),
            Err(Error::PermissionDenied)
        ));
    }

    #[test]
    fn test_import_validates_file() {
        let env = TestEnv::new();

        let err = import_template(env.store(), &env.admin, "Binary", vec![0xff, 0xfe, 0x00])
            .unwrap_err();
        match err {
            Error::ImportError(msg) => assert!(msg.contains("UTF-8")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(list_templates(env.store(), &env.admin).unwrap().is_empty());

        let imported =
            import_template(env.store(), &env.admin, "Night shift", b"Shift: night".to_vec())
                .unwrap();
        assert_eq!(imported.content, "Shift: night");
    }

    #[test]
    fn test_import_accepts_blank_files() {
        let env = TestEnv::new();

        let blank = import_template(env.store(), &env.admin, "Blank", b"  \n".to_vec()).unwrap();
        assert_eq!(blank.content, "  \n");
        let empty = import_template(env.store(), &env.admin, "Empty", Vec::new()).unwrap();
        assert_eq!(empty.content, "");
        assert_eq!(list_templates(env.store(), &env.admin).unwrap().len(), 2);
    }

    #[test]
    fn test_delete() {
        let env = TestEnv::new();
        let template = add_template(env.store(), &env.admin, "Patrol", "a").unwrap();

        delete_template(env.store(), &env.admin, &template.id).unwrap();
        assert!(matches!(
            delete_template(env.store(), &env.admin, &template.id),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            get_template(env.store(), &env.admin, &template.id),
            Err(Error::NotFound)
        ));
    }
}
