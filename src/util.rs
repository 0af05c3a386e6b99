use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::ops::Add;
use std::path::Path;

/// Sum two tallies key by key. Keys missing from one side count as zero.
pub fn additive_merge<K, V>(a: &BTreeMap<K, V>, b: &BTreeMap<K, V>) -> BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Copy + Default + Add<Output = V>,
{
    let mut output = a.clone();
    for (key, value) in b {
        let entry = output.entry(key.clone()).or_default();
        *entry = *entry + *value;
    }
    output
}

/// Write `value` as pretty-printed JSON, creating parent directories as needed.
pub fn write_serialized<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

pub fn read_serialized<T: DeserializeOwned>(path: &Path) -> std::io::Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
