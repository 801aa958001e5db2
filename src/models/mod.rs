//! Data models for MediaSage.

mod item;

pub use item::{
    AnalysisItem, ImageItem, ItemPatch, SummarizeConfig, SummaryFocus, SummaryFormat,
    SummaryLength, TextItem,
};
