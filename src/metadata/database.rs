//! The decoded metadata database of a WinMD file.
//!
//! [`Database`] is the single entry point: it locates the metadata inside the PE image, reads
//! the stream directory, computes the table schema and slices the `#~` stream into tables. All
//! of this happens once, in the constructor. Afterwards every accessor is a plain borrow of
//! immutable state, so a `Database` can be shared between threads without locking.
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmd::{metadata::tables::{columns::module, TableKind}, Database};
//!
//! let db = Database::from_file("Windows.Foundation.winmd")?;
//! let module = db.table(TableKind::Module).row(0)?;
//! println!("{} ({})", module.string(module::NAME)?, db.root().version);
//!
//! for namespace in db.namespaces()? {
//!     println!("{namespace}");
//! }
//! # Ok::<(), winmd::Error>(())
//! ```

use std::{collections::BTreeSet, path::Path};

use log::{debug, warn};
use strum::IntoEnumIterator;

use crate::{
    file::{image::Image, ByteView},
    metadata::{
        config::DecoderConfig,
        cor20header::Cor20Header,
        root::MetadataRoot,
        streams::{BlobsHeap, GuidHeap, StringsHeap, TablesStreamHeader, TABLES_STREAM},
        tables::{columns, DatabaseSchema, HeapKind, Table, TableKind},
    },
    Error, Result,
};

/// Streams that may legitimately appear in a metadata root
const KNOWN_STREAMS: [&str; 6] = ["#~", "#-", "#Strings", "#US", "#GUID", "#Blob"];

/// A byte range within the input, as (offset, length)
type Segment = (usize, usize);

/// A decoded WinMD metadata database
#[derive(Debug)]
pub struct Database {
    data: ByteView,
    image: Image,
    cor20: Cor20Header,
    root: MetadataRoot,
    tables_header: TablesStreamHeader,
    schema: DatabaseSchema,
    config: DecoderConfig,
    tables: [Segment; 64],
    heaps: [Option<Segment>; 3],
}

impl Database {
    /// Open and decode the file at `path`, which is memory-mapped for the lifetime of the
    /// database.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, and any decode error of
    /// [`Database::from_view_with_config`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Database> {
        Self::from_file_with_config(path, DecoderConfig::default())
    }

    /// Open and decode the file at `path` with an explicit configuration.
    ///
    /// # Errors
    /// See [`Database::from_file`].
    pub fn from_file_with_config(path: impl AsRef<Path>, config: DecoderConfig) -> Result<Database> {
        Self::from_view_with_config(ByteView::from_file(path)?, config)
    }

    /// Decode a WinMD image held in memory.
    ///
    /// # Errors
    /// See [`Database::from_view_with_config`].
    pub fn from_mem(data: Vec<u8>) -> Result<Database> {
        Self::from_mem_with_config(data, DecoderConfig::default())
    }

    /// Decode a WinMD image held in memory with an explicit configuration.
    ///
    /// # Errors
    /// See [`Database::from_view_with_config`].
    pub fn from_mem_with_config(data: Vec<u8>, config: DecoderConfig) -> Result<Database> {
        Self::from_view_with_config(ByteView::from_mem(data), config)
    }

    /// Decode the WinMD image covered by `data`.
    ///
    /// # Errors
    /// - [`crate::Error::BadImageFormat`] for any structural violation of the PE image, the COM
    ///   header, the metadata root, the heaps or the tables stream, including a table that runs
    ///   past the end of the `#~` stream and, with
    ///   [`DecoderConfig::reject_duplicate_streams`], a stream name that appears twice
    /// - [`crate::Error::MetadataStreamNotFound`] if there is no `#~` stream
    /// - [`crate::Error::UnsupportedSchema`] if the tables stream declares an unsupported table
    pub fn from_view_with_config(data: ByteView, config: DecoderConfig) -> Result<Database> {
        let bytes = data.data();

        let image = Image::parse(bytes)?;
        let location = image.locate_metadata(bytes)?;
        let metadata = data.slice(location.offset, location.size)?;

        let root = MetadataRoot::read(metadata)?;
        check_streams(&root, &config)?;

        let tables_stream = root.stream(TABLES_STREAM)?;
        let tables_start = location.offset + tables_stream.offset as usize;
        let tables_data = data.slice(tables_start, tables_stream.size as usize)?;

        let tables_header = TablesStreamHeader::read(tables_data)?;
        let schema = DatabaseSchema::new(&tables_header, &config);

        let mut tables = [(0, 0); 64];
        let mut offset = tables_header.tables_offset();
        for kind in tables_header.present_tables() {
            let layout = schema.layout(kind);
            let end = schema
                .table_size(kind)
                .and_then(|size| offset.checked_add(size));

            match end {
                Some(end) if end <= tables_data.len() => {
                    debug!(
                        "Table {} at 0x{:X}: {} rows of {} bytes",
                        kind,
                        offset,
                        schema.rows(kind),
                        layout.stride()
                    );

                    tables[kind.number() as usize] = (tables_start + offset, end - offset);
                    offset = end;
                }
                _ => {
                    return Err(bad_image_format!(
                        "Table {} with {} rows of {} bytes at 0x{:X} exceeds the tables stream of {} bytes",
                        kind,
                        schema.rows(kind),
                        layout.stride(),
                        offset,
                        tables_data.len()
                    ))
                }
            }
        }

        if offset < tables_data.len() {
            debug!(
                "{} bytes of padding behind the last table",
                tables_data.len() - offset
            );
        }

        let mut heaps = [None; 3];
        for heap in [HeapKind::Strings, HeapKind::Guid, HeapKind::Blob] {
            let Ok(stream) = root.stream(heap.stream_name()) else {
                debug!("No {} stream", heap.stream_name());
                continue;
            };

            let segment = (
                location.offset + stream.offset as usize,
                stream.size as usize,
            );
            let heap_data = data.slice(segment.0, segment.1)?;
            match heap {
                HeapKind::Strings => {
                    StringsHeap::from(heap_data)?;
                }
                HeapKind::Guid => {
                    GuidHeap::from(heap_data)?;
                }
                HeapKind::Blob => {
                    BlobsHeap::from(heap_data)?;
                }
            }

            heaps[heap as usize] = Some(segment);
        }

        debug!(
            "Decoded metadata '{}' with {} tables",
            root.version,
            tables_header.table_count()
        );

        Ok(Database {
            data,
            image,
            cor20: location.cor20,
            root,
            tables_header,
            schema,
            config,
            tables,
            heaps,
        })
    }

    /// The table of `kind`. Tables absent from the file are returned empty.
    #[must_use]
    pub fn table(&self, kind: TableKind) -> Table<'_> {
        Table::new(self, kind)
    }

    /// All tables present in the file, in ascending table-number order
    pub fn tables(&self) -> impl Iterator<Item = Table<'_>> + '_ {
        TableKind::iter()
            .filter(|kind| self.schema.is_present(*kind))
            .map(|kind| self.table(kind))
    }

    /// The `#Strings` heap
    ///
    /// # Errors
    /// Returns [`crate::Error::MetadataStreamNotFound`] if the file has no `#Strings` stream
    pub fn strings(&self) -> Result<StringsHeap<'_>> {
        StringsHeap::from(self.heap(HeapKind::Strings)?)
    }

    /// The `#Blob` heap
    ///
    /// # Errors
    /// Returns [`crate::Error::MetadataStreamNotFound`] if the file has no `#Blob` stream
    pub fn blobs(&self) -> Result<BlobsHeap<'_>> {
        BlobsHeap::from(self.heap(HeapKind::Blob)?)
    }

    /// The `#GUID` heap
    ///
    /// # Errors
    /// Returns [`crate::Error::MetadataStreamNotFound`] if the file has no `#GUID` stream
    pub fn guids(&self) -> Result<GuidHeap<'_>> {
        GuidHeap::from(self.heap(HeapKind::Guid)?)
    }

    /// The distinct, non-empty namespaces of all types defined in this file, sorted
    ///
    /// # Errors
    /// Returns an error if a `TypeDef.TypeNamespace` entry cannot be resolved
    pub fn namespaces(&self) -> Result<BTreeSet<&str>> {
        let mut namespaces = BTreeSet::new();

        for row in self.table(TableKind::TypeDef).rows() {
            let namespace = row.string(columns::type_def::TYPE_NAMESPACE)?;
            if !namespace.is_empty() {
                namespaces.insert(namespace);
            }
        }

        Ok(namespaces)
    }

    /// The metadata root and its stream directory
    #[must_use]
    pub fn root(&self) -> &MetadataRoot {
        &self.root
    }

    /// The header of the `#~` stream
    #[must_use]
    pub fn tables_header(&self) -> &TablesStreamHeader {
        &self.tables_header
    }

    /// The computed index widths and table layouts
    #[must_use]
    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    /// The PE headers of the input
    #[must_use]
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// The COM header pointing at the metadata
    #[must_use]
    pub fn cor20_header(&self) -> &Cor20Header {
        &self.cor20
    }

    /// The configuration this database was decoded with
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// The complete input
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    pub(crate) fn table_data(&self, kind: TableKind) -> &[u8] {
        let (offset, len) = self.tables[kind.number() as usize];
        self.data.slice(offset, len).unwrap_or_default()
    }

    fn heap(&self, heap: HeapKind) -> Result<&[u8]> {
        match self.heaps[heap as usize] {
            Some((offset, len)) => self.data.slice(offset, len),
            None => Err(Error::MetadataStreamNotFound(heap.stream_name().to_string())),
        }
    }
}

fn check_streams(root: &MetadataRoot, config: &DecoderConfig) -> Result<()> {
    for stream in &root.stream_headers {
        if !KNOWN_STREAMS.contains(&stream.name.as_str()) {
            warn!("Ignoring unknown metadata stream '{}'", stream.name);
        }
    }

    let duplicates = root.duplicate_streams();
    if duplicates.is_empty() {
        return Ok(());
    }

    if config.reject_duplicate_streams {
        return Err(bad_image_format!(
            "Metadata streams appear more than once - {}",
            duplicates.join(", ")
        ));
    }

    warn!(
        "Metadata streams appear more than once, using the first of each - {}",
        duplicates.join(", ")
    );
    Ok(())
}
