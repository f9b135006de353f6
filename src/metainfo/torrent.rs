use super::error::MetainfoError;
use super::info_hash::InfoHash;
use crate::bencode::{decode, encode, Node};
use crate::constants::{MD5_HEX_LEN, SHA1_LEN};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

/// Whether the info dictionary described one file or a directory of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// `length` directly in the info dictionary.
    Single,
    /// A `files` list in the info dictionary.
    Multiple,
}

/// A parsed torrent descriptor.
///
/// Built once from a decoded tree by [`Metainfo::parse`] and never mutated.
///
/// # Examples
///
/// ```
/// use btwire::metainfo::Metainfo;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let data = b"d8:announce20:http://t.example/ann4:infod6:lengthi5e4:name5:a.txt\
///              12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee";
/// let (metainfo, info_hash) = Metainfo::from_bytes(data)?;
///
/// assert_eq!(metainfo.files[0].path, vec!["a.txt".to_string()]);
/// assert_eq!(metainfo.piece_count(), 1);
/// println!("{}", info_hash);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metainfo {
    /// Suggested file or directory name (`info.name`).
    pub name: String,
    /// Number of bytes per piece, always non-zero.
    pub piece_length: u64,
    /// Concatenated 20-byte SHA-1 digests, one per piece.
    pub pieces: Bytes,
    /// If true, clients should only use trackers in the metainfo.
    pub private: bool,
    pub mode: FileMode,
    /// Files in order. Every path starts with `name`.
    pub files: Vec<FileDescription>,
    /// Primary tracker URL.
    pub announce: String,
    /// Tiered tracker lists ([BEP-12](http://bittorrent.org/beps/bep_0012.html)).
    pub announce_tiers: Option<Vec<Vec<String>>>,
    /// Unix timestamp when the torrent was created.
    pub creation_date: Option<u64>,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    /// Character encoding of the string fields, as declared by the creator.
    pub encoding: Option<String>,
}

/// One file of a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescription {
    pub length: u64,
    /// 32 hex characters, when the creator supplied one.
    pub md5sum: Option<String>,
    /// Path segments, with the torrent name as the first segment.
    pub path: Vec<String>,
}

impl Metainfo {
    /// Decodes `data`, projects it and hashes the raw info dictionary.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, InfoHash), MetainfoError> {
        let root = decode(data)?;
        let metainfo = Self::parse(&root)?;
        let info_hash = Self::info_hash(&root, data)?;
        Ok((metainfo, info_hash))
    }

    /// Projects a decoded root dictionary into a validated `Metainfo`.
    pub fn parse(root: &Node) -> Result<Self, MetainfoError> {
        let top = Dict::root(root)?;
        let info = top.child_dict(b"info", "info")?;

        let piece_length = info.required_u64(b"piece length", "piece length")?;
        if piece_length == 0 {
            return Err(MetainfoError::InvalidPieceLength);
        }

        let pieces = info.required_bytes(b"pieces", "pieces")?.clone();
        if pieces.len() % SHA1_LEN != 0 {
            return Err(MetainfoError::InvalidPiecesLength(pieces.len()));
        }

        let private = match info.optional_int(b"private", "private")? {
            None | Some(0) => false,
            Some(1) => true,
            Some(other) => return Err(MetainfoError::InvalidPrivate(other)),
        };

        let name = info.required_string(b"name", "name")?;
        let announce = top.required_string(b"announce", "announce")?;

        let announce_tiers = match top.optional_list(b"announce-list", "announce-list")? {
            None => None,
            Some(tiers) => Some(parse_tiers(tiers)?),
        };

        let creation_date = top.optional_u64(b"creation date", "creation date")?;
        let comment = top.optional_string(b"comment", "comment")?;
        let created_by = top.optional_string(b"created by", "created by")?;
        let encoding = top.optional_string(b"encoding", "encoding")?;

        let has_length = info.contains(b"length");
        let has_files = info.contains(b"files");

        let (mode, files) = match (has_length, has_files) {
            (true, true) => return Err(MetainfoError::BothFileModes),
            (false, false) => return Err(MetainfoError::NeitherFileMode),
            (true, false) => {
                let length = info.required_u64(b"length", "length")?;
                let md5sum = info.optional_md5sum()?;
                let file = FileDescription {
                    length,
                    md5sum,
                    path: vec![name.clone()],
                };
                (FileMode::Single, vec![file])
            }
            (false, true) => {
                let entries = info.required_list(b"files", "files")?;
                let files = entries
                    .iter()
                    .enumerate()
                    .map(|(i, entry)| parse_file_entry(entry, i, &name))
                    .collect::<Result<Vec<_>, _>>()?;
                (FileMode::Multiple, files)
            }
        };

        Ok(Self {
            name,
            piece_length,
            pieces,
            private,
            mode,
            files,
            announce,
            announce_tiers,
            creation_date,
            comment,
            created_by,
            encoding,
        })
    }

    /// Computes the info hash over the exact bytes the `info` value occupied
    /// in `buffer`, the buffer `root` was decoded from.
    ///
    /// This is the only correct way to identify a torrent: the digest is
    /// defined over the original bytes, which may not be in canonical order.
    pub fn info_hash(root: &Node, buffer: &[u8]) -> Result<InfoHash, MetainfoError> {
        let info = info_node(root)?;
        let raw = info
            .raw(buffer)
            .ok_or(MetainfoError::InfoSpanOutOfBounds)?;
        Ok(InfoHash::from_info_bytes(raw))
    }

    /// Computes the info hash over a canonical re-encoding of the `info`
    /// subtree, for trees that were built in code or whose source buffer is
    /// gone.
    ///
    /// The result differs from [`Metainfo::info_hash`] whenever the source
    /// listed dictionary keys out of order, so it must not be used to
    /// identify torrents read from disk or the network.
    pub fn info_hash_reencoded(root: &Node) -> Result<InfoHash, MetainfoError> {
        let info = info_node(root)?;
        Ok(InfoHash::from_info_bytes(&encode(info)))
    }

    pub fn is_single_file(&self) -> bool {
        self.mode == FileMode::Single
    }

    /// Sum of all file lengths.
    pub fn total_length(&self) -> u64 {
        self.files.iter().map(|f| f.length).sum()
    }

    pub fn piece_count(&self) -> usize {
        self.pieces.len() / SHA1_LEN
    }

    /// The expected SHA-1 of piece `index`.
    pub fn piece_hash(&self, index: usize) -> Option<[u8; SHA1_LEN]> {
        let start = index.checked_mul(SHA1_LEN)?;
        let end = start.checked_add(SHA1_LEN)?;
        let slice = self.pieces.get(start..end)?;
        slice.try_into().ok()
    }

    /// Returns all tracker URLs from both `announce` and the tiers.
    ///
    /// The primary tracker comes first, followed by tier URLs in order.
    /// Duplicates are removed.
    pub fn trackers(&self) -> Vec<String> {
        let mut trackers = vec![self.announce.clone()];

        for tier in self.announce_tiers.iter().flatten() {
            for tracker in tier {
                if !trackers.contains(tracker) {
                    trackers.push(tracker.clone());
                }
            }
        }

        trackers
    }
}

/// Returns `true` if `sum` is exactly 32 hex digits (either case).
pub fn is_valid_md5sum(sum: &str) -> bool {
    sum.len() == MD5_HEX_LEN && sum.bytes().all(|c| c.is_ascii_hexdigit())
}

fn info_node(root: &Node) -> Result<&Node, MetainfoError> {
    let top = Dict::root(root)?;
    top.child_dict(b"info", "info")?;
    top.required(b"info", "info")
}

fn parse_tiers(tiers: &[Node]) -> Result<Vec<Vec<String>>, MetainfoError> {
    tiers
        .iter()
        .map(|tier| {
            let urls = tier
                .as_list()
                .ok_or_else(|| type_error("root", "announce-list", "list", tier))?;
            urls.iter()
                .map(|url| {
                    let bytes = url
                        .as_bytes()
                        .ok_or_else(|| type_error("root", "announce-list", "string", url))?;
                    utf8(bytes, "root", "announce-list")
                })
                .collect()
        })
        .collect()
}

fn parse_file_entry(
    entry: &Node,
    index: usize,
    name: &str,
) -> Result<FileDescription, MetainfoError> {
    let context = format!("files[{}]", index);
    let file = Dict::wrap(entry, context.clone(), "info", "files")?;

    let length = file.required_u64(b"length", "length")?;
    let md5sum = file.optional_md5sum()?;

    let segments = file.required_list(b"path", "path")?;
    if segments.is_empty() {
        return Err(MetainfoError::EmptyPath { dict: context });
    }

    let mut path = Vec::with_capacity(segments.len() + 1);
    path.push(name.to_string());
    for segment in segments {
        let bytes = segment
            .as_bytes()
            .ok_or_else(|| type_error(&context, "path", "string", segment))?;
        path.push(utf8(bytes, &context, "path")?);
    }

    Ok(FileDescription {
        length,
        md5sum,
        path,
    })
}

fn type_error(
    dict: &str,
    field: &'static str,
    expected: &'static str,
    found: &Node,
) -> MetainfoError {
    MetainfoError::InvalidType {
        dict: dict.to_string(),
        field,
        expected,
        found: found.kind(),
    }
}

fn utf8(bytes: &[u8], dict: &str, field: &'static str) -> Result<String, MetainfoError> {
    std::str::from_utf8(bytes)
        .map(String::from)
        .map_err(|_| MetainfoError::InvalidUtf8 {
            dict: dict.to_string(),
            field,
        })
}

/// Typed field access on one dictionary, producing contextual errors.
struct Dict<'a> {
    entries: &'a BTreeMap<Bytes, Node>,
    context: String,
}

impl<'a> Dict<'a> {
    fn root(node: &'a Node) -> Result<Self, MetainfoError> {
        Self::wrap(node, "root".into(), "torrent", "root")
    }

    /// Views `node`, found as `field` in dictionary `parent`, as a dictionary
    /// that reports its own errors as `context`.
    fn wrap(
        node: &'a Node,
        context: String,
        parent: &str,
        field: &'static str,
    ) -> Result<Self, MetainfoError> {
        let entries = node
            .as_dict()
            .ok_or_else(|| type_error(parent, field, "dictionary", node))?;
        Ok(Self { entries, context })
    }

    fn child_dict(&self, key: &[u8], field: &'static str) -> Result<Dict<'a>, MetainfoError> {
        let node = self.required(key, field)?;
        Self::wrap(node, field.to_string(), &self.context, field)
    }

    fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    fn required(&self, key: &[u8], field: &'static str) -> Result<&'a Node, MetainfoError> {
        self.entries
            .get(key)
            .ok_or_else(|| MetainfoError::MissingField {
                dict: self.context.clone(),
                field,
            })
    }

    fn optional_int(&self, key: &[u8], field: &'static str) -> Result<Option<i64>, MetainfoError> {
        self.entries
            .get(key)
            .map(|node| {
                node.as_integer()
                    .ok_or_else(|| type_error(&self.context, field, "integer", node))
            })
            .transpose()
    }

    fn optional_u64(&self, key: &[u8], field: &'static str) -> Result<Option<u64>, MetainfoError> {
        self.optional_int(key, field)?
            .map(|v| {
                u64::try_from(v).map_err(|_| MetainfoError::NegativeValue {
                    dict: self.context.clone(),
                    field,
                })
            })
            .transpose()
    }

    fn required_u64(&self, key: &[u8], field: &'static str) -> Result<u64, MetainfoError> {
        let node = self.required(key, field)?;
        let value = node
            .as_integer()
            .ok_or_else(|| type_error(&self.context, field, "integer", node))?;
        u64::try_from(value).map_err(|_| MetainfoError::NegativeValue {
            dict: self.context.clone(),
            field,
        })
    }

    fn optional_bytes(
        &self,
        key: &[u8],
        field: &'static str,
    ) -> Result<Option<&'a Bytes>, MetainfoError> {
        self.entries
            .get(key)
            .map(|node| {
                node.as_bytes()
                    .ok_or_else(|| type_error(&self.context, field, "string", node))
            })
            .transpose()
    }

    fn required_bytes(&self, key: &[u8], field: &'static str) -> Result<&'a Bytes, MetainfoError> {
        let node = self.required(key, field)?;
        node.as_bytes()
            .ok_or_else(|| type_error(&self.context, field, "string", node))
    }

    fn optional_string(
        &self,
        key: &[u8],
        field: &'static str,
    ) -> Result<Option<String>, MetainfoError> {
        self.optional_bytes(key, field)?
            .map(|b| utf8(b, &self.context, field))
            .transpose()
    }

    fn required_string(&self, key: &[u8], field: &'static str) -> Result<String, MetainfoError> {
        let bytes = self.required_bytes(key, field)?;
        utf8(bytes, &self.context, field)
    }

    fn optional_list(
        &self,
        key: &[u8],
        field: &'static str,
    ) -> Result<Option<&'a [Node]>, MetainfoError> {
        self.entries
            .get(key)
            .map(|node| {
                node.as_list()
                    .ok_or_else(|| type_error(&self.context, field, "list", node))
            })
            .transpose()
    }

    fn required_list(&self, key: &[u8], field: &'static str) -> Result<&'a [Node], MetainfoError> {
        let node = self.required(key, field)?;
        node.as_list()
            .ok_or_else(|| type_error(&self.context, field, "list", node))
    }

    fn optional_md5sum(&self) -> Result<Option<String>, MetainfoError> {
        let Some(sum) = self.optional_string(b"md5sum", "md5sum")? else {
            return Ok(None);
        };
        if !is_valid_md5sum(&sum) {
            return Err(MetainfoError::InvalidMd5sum {
                dict: self.context.clone(),
            });
        }
        Ok(Some(sum))
    }
}

impl fmt::Display for FileDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File[len: {}, path: {}", self.length, self.path.join("/"))?;
        if let Some(ref md5sum) = self.md5sum {
            write!(f, ", md5sum: {}", md5sum)?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for Metainfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        writeln!(f, "  name: {}", self.name)?;
        writeln!(f, "  piece length: {}", self.piece_length)?;
        writeln!(f, "  pieces: {} digests", self.piece_count())?;
        writeln!(f, "  private: {}", self.private)?;
        writeln!(f, "  announce: {}", self.announce)?;
        if let Some(ref tiers) = self.announce_tiers {
            writeln!(f, "  announce list: [")?;
            for tier in tiers {
                writeln!(f, "    [ {} ]", tier.join(" "))?;
            }
            writeln!(f, "  ]")?;
        }
        if let Some(date) = self.creation_date {
            writeln!(f, "  creation date: {}", date)?;
        }
        if let Some(ref comment) = self.comment {
            writeln!(f, "  comment: {}", comment)?;
        }
        if let Some(ref created_by) = self.created_by {
            writeln!(f, "  created by: {}", created_by)?;
        }
        if let Some(ref encoding) = self.encoding {
            writeln!(f, "  encoding: {}", encoding)?;
        }
        writeln!(f, "  files: [")?;
        for file in &self.files {
            writeln!(f, "    {}", file)?;
        }
        writeln!(f, "  ]")?;
        write!(f, "}}")
    }
}
