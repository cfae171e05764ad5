//! End-to-end tests driving the plugin host over a migrated SQLite database.

mod helpers;

mod hook_test;
mod widget_test;
