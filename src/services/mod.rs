pub mod chip_fetcher;
pub mod csv_store;
pub mod date_converter;
pub mod indicator_engine;
pub mod merger;
pub mod notifier;
pub mod price_fetcher;
pub mod renderer;
pub mod table_cleaner;
pub mod volume_profile;

pub use chip_fetcher::{extract_tables, ChipFetcher};
pub use csv_store::{read_daily_bars, write_merged_rows};
pub use date_converter::{is_regional_date, regional_to_iso};
pub use indicator_engine::enhance;
pub use merger::merge;
pub use notifier::{caption_for, Notification, Notifier, WebhookNotifier};
pub use price_fetcher::{parse_chart_response, PriceFetcher};
pub use renderer::{DashboardFrame, DashboardRenderer, PngRenderer};
pub use table_cleaner::{clean_table, ColumnContract, RawTable};
pub use volume_profile::{calculate_volume_profile, VolumeProfile};
