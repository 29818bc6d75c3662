pub mod series_api;
