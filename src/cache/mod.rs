pub mod auth_style_cache;
