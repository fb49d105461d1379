mod asset_index;

pub use asset_index::{index_path, load_asset_index, AssetIndex, AssetObject};
