pub mod category_cache;
