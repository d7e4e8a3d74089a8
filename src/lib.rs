pub mod datatypes;
pub mod cursor;
pub mod tags;
pub mod record;
pub mod group;
pub mod subrecord;
pub mod extractors;
pub mod decoder;
pub mod merge;
pub mod load_order;
pub mod discovery;
pub mod plugin;
pub mod pipeline;
pub mod config;
pub mod utils;

#[cfg(test)]
mod testing;

// 重新导出主要结构
pub use config::MergeConfig;
pub use datatypes::{FormId, Position, Priority};
pub use decoder::{DecoderState, PluginDecoder};
pub use discovery::find_plugins;
pub use extractors::{ExtractorRegistry, ParsedRecord, PerkRecord, SkillTreeRecord};
pub use load_order::LoadOrder;
pub use merge::{ClaimCheck, NoClaims, PluginRecords, ResolvedRecord, ResolvedRecordStore};
pub use pipeline::{merge_parallel, merge_sequential, run, MergeStats};
pub use plugin::Plugin;
pub use tags::{decode_field_tag, decode_tag, encode_field_tag, encode_tag, FieldType, RecordType};
pub use utils::{ErrorOffset, EspError};
