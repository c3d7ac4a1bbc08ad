// ============================================================================
// 堆快照模块 - 类名解析 + 对象目录
// ============================================================================
//
// ParsedDump (数字 class id) --resolve--> HeapSnapshot (类名 + 大小)
//
// 解析是强制步骤：分类只能在 HeapSnapshot 上进行，未解析的类引用直接报错，
// 不会被静默跳过。
//
// ============================================================================

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SnapshotError;
use crate::hprof::{BasicType, ClassRef, HprofHeader, HprofReader, ParsedDump};

/// Class name HotSpot gives to class objects themselves
pub const CLASS_CLASS_NAME: &str = "java.lang.Class";

/// One resolved heap object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeapObject {
    /// JVM class name, e.g. `[I`, `[B`, `java.lang.String`
    pub class_name: Arc<str>,
    /// Size in bytes as reported by the dump record
    pub size: u64,
}

impl HeapObject {
    pub fn new(class_name: &str, size: u64) -> Self {
        Self {
            class_name: Arc::from(class_name),
            size,
        }
    }
}

/// Per-class totals for the histogram view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassStats {
    pub class_name: String,
    pub instances: u64,
    pub total_bytes: u64,
}

/// Immutable, ordered collection of resolved objects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectCatalog {
    objects: Vec<HeapObject>,
}

impl ObjectCatalog {
    /// All objects in dump order; can be called any number of times
    pub fn all_objects(&self) -> impl Iterator<Item = &HeapObject> + '_ {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.objects.iter().map(|o| o.size).sum()
    }

    /// Instance count and bytes per class, largest first
    pub fn class_histogram(&self) -> Vec<ClassStats> {
        let mut by_class: HashMap<&str, (u64, u64)> = HashMap::new();
        for obj in &self.objects {
            let entry = by_class.entry(&*obj.class_name).or_default();
            entry.0 += 1;
            entry.1 += obj.size;
        }

        let mut stats: Vec<ClassStats> = by_class
            .into_iter()
            .map(|(name, (instances, total_bytes))| ClassStats {
                class_name: name.to_string(),
                instances,
                total_bytes,
            })
            .collect();
        stats.sort_by(|a, b| {
            b.total_bytes
                .cmp(&a.total_bytes)
                .then_with(|| a.class_name.cmp(&b.class_name))
        });
        stats
    }
}

impl From<Vec<HeapObject>> for ObjectCatalog {
    fn from(objects: Vec<HeapObject>) -> Self {
        Self { objects }
    }
}

impl FromIterator<HeapObject> for ObjectCatalog {
    fn from_iter<I: IntoIterator<Item = HeapObject>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

/// A fully resolved heap dump
#[derive(Debug, Clone)]
pub struct HeapSnapshot {
    header: HprofHeader,
    catalog: ObjectCatalog,
}

impl HeapSnapshot {
    pub fn new(header: HprofHeader, catalog: ObjectCatalog) -> Self {
        Self { header, catalog }
    }

    pub fn header(&self) -> &HprofHeader {
        &self.header
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    pub fn all_objects(&self) -> impl Iterator<Item = &HeapObject> + '_ {
        self.catalog.all_objects()
    }
}

/// Read and resolve a heap dump file.
///
/// The file is memory-mapped only for the duration of the parse; the mapping
/// and the file handle are released before resolution starts, on both the
/// success and error paths.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<HeapSnapshot, SnapshotError> {
    let path = path.as_ref();
    let dump = {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and dropped at the end of this block;
        // the dump is a finished artifact that nothing writes to while we parse.
        let mmap = unsafe { Mmap::map(&file)? };
        info!(path = %path.display(), bytes = mmap.len(), "mapping heap dump");
        HprofReader::new(&mmap).read()?
    };
    dump.resolve()
}

impl ParsedDump {
    /// Replace every numeric class reference with its class name
    pub fn resolve(self) -> Result<HeapSnapshot, SnapshotError> {
        let mut names: HashMap<u64, Arc<str>> = HashMap::with_capacity(self.loaded_classes.len());
        for (&class_id, &name_id) in &self.loaded_classes {
            let raw = self.strings.get(&name_id).ok_or(SnapshotError::UnresolvedReference {
                object_id: class_id,
                class_id: name_id,
            })?;
            names.insert(class_id, Arc::from(raw.replace('/', ".")));
        }

        let class_class: Arc<str> = Arc::from(CLASS_CLASS_NAME);
        // java.lang.Class 的实例大小，用作 class 对象本身的大小
        let class_object_size = names
            .iter()
            .find(|(_, name)| &***name == CLASS_CLASS_NAME)
            .and_then(|(id, _)| self.class_dumps.get(id))
            .map(|c| u64::from(c.instance_size))
            .unwrap_or(0);

        let mut primitive_names: HashMap<BasicType, Arc<str>> = HashMap::new();
        let mut objects = Vec::with_capacity(self.objects.len());

        for raw in self.objects {
            let (class_name, size) = match raw.class {
                ClassRef::Class(class_id) => {
                    let name = names.get(&class_id).ok_or(SnapshotError::UnresolvedReference {
                        object_id: raw.id,
                        class_id,
                    })?;
                    (Arc::clone(name), raw.size)
                }
                ClassRef::PrimitiveArray(element) => {
                    let name = primitive_names.entry(element).or_insert_with(|| {
                        // reader 已拒绝 object 元素类型
                        Arc::from(element.array_class_name().unwrap_or("[?"))
                    });
                    (Arc::clone(name), raw.size)
                }
                ClassRef::ClassObject => (Arc::clone(&class_class), class_object_size),
            };
            objects.push(HeapObject { class_name, size });
        }

        debug!(
            objects = objects.len(),
            classes = names.len(),
            "class references resolved"
        );

        Ok(HeapSnapshot::new(self.header, ObjectCatalog::from(objects)))
    }
}
