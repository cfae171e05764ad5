//! Hook resolution and dispatch through the plugin manager.

use serde_json::json;

use kiln_core::error::AppError;
use kiln_entity::plugin::NewPlugin;
use kiln_plugin::PluginClass;

use crate::helpers::TestHost;

fn echo(class: &str, hook: &str) -> PluginClass {
    let tag = class.to_lowercase();
    PluginClass::new(class).on_fn(hook, move |_ctx, _p| {
        let tag = tag.clone();
        async move { Ok(json!(tag)) }
    })
}

#[tokio::test]
async fn test_leaf_of_override_chain_wins() {
    let host = TestHost::with_override_chain().await;

    let targets = host.manager.resolve("onSave", None, &[]).await.unwrap();
    let classes: Vec<_> = targets.iter().map(|t| t.class.as_str()).collect();
    assert_eq!(classes, vec!["ExtHandler"]);

    let results = host
        .manager
        .plugin_hook("onSave", None, &json!({"id": 3}), &[])
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results.get("ExtHandler_onSave"),
        Some(&json!({"folder": "ext", "params": {"id": 3}}))
    );
    assert!(!results.contains_key("CoreHandler_onSave"));
}

#[tokio::test]
async fn test_disabling_child_restores_parent() {
    let host = TestHost::with_override_chain().await;
    assert!(host.manager.set_enabled("ext", false).await.unwrap());

    let targets = host.manager.resolve("onSave", None, &[]).await.unwrap();
    let classes: Vec<_> = targets.iter().map(|t| t.class.as_str()).collect();
    assert_eq!(classes, vec!["CoreHandler"]);

    let results = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.get("CoreHandler_onSave"), Some(&json!("core")));
}

#[tokio::test]
async fn test_status_written_outside_the_host_applies_to_next_dispatch() {
    let host = TestHost::with_override_chain().await;
    let first = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert!(first.contains_key("ExtHandler_onSave"));

    sqlx::query("UPDATE plugins SET plugin_enabled = 0 WHERE plugin_folder = 'ext'")
        .execute(&host.pool)
        .await
        .unwrap();

    assert!(!host.manager.is_active("ext").await.unwrap());
    let second = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(second.keys().collect::<Vec<_>>(), vec!["CoreHandler_onSave"]);
}

#[tokio::test]
async fn test_excluding_only_implementer_yields_nothing() {
    let host = TestHost::with_override_chain().await;

    // The parent stays suppressed by its enabled child even when the child
    // itself is excluded.
    let exclude = vec!["ext".to_string()];
    assert!(
        host.manager
            .plugin_hook("onSave", None, &json!(null), &exclude)
            .await
            .is_none()
    );

    let exclude = vec!["core".to_string()];
    let results = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &exclude)
        .await
        .unwrap();
    assert!(results.contains_key("ExtHandler_onSave"));
}

#[tokio::test]
async fn test_unbound_and_empty_hooks_return_nothing() {
    let host = TestHost::with_override_chain().await;

    assert!(host.manager.resolve("onPublish", None, &[]).await.unwrap().is_empty());
    assert!(host.manager.plugin_hook("onPublish", None, &json!(null), &[]).await.is_none());
    assert!(host.manager.plugin_hook("", None, &json!(null), &[]).await.is_none());
}

#[tokio::test]
async fn test_inherited_method_runs_with_parent_profile() {
    let host = TestHost::with_override_chain().await;
    host.manager.bind_hook("ext", "onLoad").await.unwrap();

    let results = host
        .manager
        .plugin_hook("onLoad", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.get("ExtHandler_onLoad"), Some(&json!("core")));
}

#[tokio::test]
async fn test_bindings_dispatch_in_insertion_order() {
    let host = TestHost::build(|b| {
        b.with_class("beta", echo("Beta", "onSave"))
            .with_class("alpha", echo("Alpha", "onSave"))
    })
    .await;
    host.install("beta", NewPlugin::new("beta", "Beta"), &["onSave"]).await;
    host.install("alpha", NewPlugin::new("alpha", "Alpha"), &["onSave"]).await;

    let results = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["Beta_onSave", "Alpha_onSave"]);

    let results = host
        .manager
        .plugin_hook("onSave", Some("alpha"), &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["Alpha_onSave"]);
}

#[tokio::test]
async fn test_missing_code_unit_is_skipped() {
    let host = TestHost::build(|b| {
        b.with_class("ghost", echo("Ghost", "onSave"))
            .with_class("alpha", echo("Alpha", "onSave"))
    })
    .await;
    host.install_without_code(NewPlugin::new("ghost", "Ghost"), &["onSave"])
        .await;
    host.install("alpha", NewPlugin::new("alpha", "Alpha"), &["onSave"]).await;

    let results = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["Alpha_onSave"]);
}

#[tokio::test]
async fn test_falsy_and_failing_handlers_do_not_contribute() {
    let host = TestHost::build(|b| {
        b.with_class(
            "zero",
            PluginClass::new("Zero").on_fn("onSave", |_c, _p| async { Ok(json!("0")) }),
        )
        .with_class(
            "broken",
            PluginClass::new("Broken").on_fn("onSave", |_c, _p| async {
                Err(AppError::internal("handler exploded"))
            }),
        )
        .with_class("alpha", echo("Alpha", "onSave"))
    })
    .await;
    host.install("zero", NewPlugin::new("zero", "Zero"), &["onSave"]).await;
    host.install("broken", NewPlugin::new("broken", "Broken"), &["onSave"]).await;
    host.install("alpha", NewPlugin::new("alpha", "Alpha"), &["onSave"]).await;

    let results = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["Alpha_onSave"]);
}

#[tokio::test]
async fn test_host_default_runs_when_class_lacks_method() {
    let host = TestHost::build(|b| {
        b.with_class("sidebar", PluginClass::new("Sidebar"))
    })
    .await;
    host.install(
        "sidebar",
        NewPlugin::new("sidebar", "Sidebar"),
        &["onRender", "onPurge"],
    )
    .await;

    let results = host
        .manager
        .plugin_hook("onRender", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.get("Sidebar_onRender"), Some(&json!("default:sidebar")));

    // Neither the class nor the host implements onPurge.
    assert!(host.manager.plugin_hook("onPurge", None, &json!(null), &[]).await.is_none());
}

#[tokio::test]
async fn test_handler_sees_profile_and_own_settings() {
    let host = TestHost::build(|b| {
        b.with_class(
            "counter",
            PluginClass::new("Counter").on_fn("onSave", |ctx, _p| async move {
                ctx.set_setting("last_hook", &ctx.hook).await?;
                Ok::<_, AppError>(json!({
                    "name": ctx.profile.name,
                    "version": ctx.profile.version,
                    "user": ctx.user.id,
                }))
            }),
        )
    })
    .await;
    host.install(
        "counter",
        NewPlugin::new("counter", "Counter").name("Hit Counter").version("2.1"),
        &["onSave"],
    )
    .await;

    let results = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(
        results.get("Counter_onSave"),
        Some(&json!({"name": "Hit Counter", "version": "2.1", "user": 7}))
    );

    let stored = host.services.settings.get("counter", "last_hook").await.unwrap();
    assert_eq!(stored.as_deref(), Some("onSave"));
}

#[tokio::test]
async fn test_plan_reports_parent_folders() {
    let host = TestHost::with_override_chain().await;
    let planned = host.manager.plan("onSave", None, &[]).await.unwrap();
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].target.folder, "ext");
    assert_eq!(planned[0].parents, vec!["core".to_string()]);

    // Planning never loads code.
    assert!(!host.manager.loader().is_loaded("ext"));
}

#[tokio::test]
async fn test_unbinding_child_hands_hook_back_to_parent() {
    let host = TestHost::with_override_chain().await;
    let bindings = host.manager.hook_bindings("ext").await.unwrap();
    assert_eq!(
        bindings.iter().map(|b| b.hook.as_str()).collect::<Vec<_>>(),
        vec!["onSave"]
    );

    assert!(host.manager.unbind_hook("ext", "onSave").await.unwrap());
    assert!(!host.manager.unbind_hook("ext", "onSave").await.unwrap());
    assert!(host.manager.hook_bindings("ext").await.unwrap().is_empty());

    let results = host
        .manager
        .plugin_hook("onSave", None, &json!(null), &[])
        .await
        .unwrap();
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["CoreHandler_onSave"]);
}
