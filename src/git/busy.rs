//! "Server is busy" responses for push and fetch.
//!
//! Both renderers take an already sanitized correlation ID and stop at the
//! first failed write, handing the error back to the caller.

use std::fmt;
use std::io::{self, Write};

use crate::git::pktline::{write_flush, write_pkt_line, write_sideband, Band};

/// Report-status line telling the client its pack was not unpacked.
pub const UNPACK_BUSY: &str = "unpack server is busy\n";

/// Git operation a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GitOperation {
    /// `git-receive-pack` (push).
    ReceivePack,
    /// `git-upload-pack` (fetch and clone).
    UploadPack,
}

impl GitOperation {
    /// Detect the operation from a smart-HTTP RPC path such as
    /// `/group/project.git/git-receive-pack`.
    pub fn from_path(path: &str) -> Option<Self> {
        let service = path.trim_end_matches('/').rsplit('/').next()?;
        match service {
            "git-receive-pack" => Some(Self::ReceivePack),
            "git-upload-pack" => Some(Self::UploadPack),
            _ => None,
        }
    }

    /// Service name as git spells it.
    pub fn service(&self) -> &'static str {
        match self {
            Self::ReceivePack => "git-receive-pack",
            Self::UploadPack => "git-upload-pack",
        }
    }

    /// Content type of a successful RPC response body.
    pub fn result_content_type(&self) -> &'static str {
        match self {
            Self::ReceivePack => "application/x-git-receive-pack-result",
            Self::UploadPack => "application/x-git-upload-pack-result",
        }
    }

    /// Render the busy response for this operation.
    pub fn write_busy<W: Write + ?Sized>(&self, w: &mut W, correlation_id: &str) -> io::Result<()> {
        match self {
            Self::ReceivePack => write_receive_pack_busy(w, correlation_id),
            Self::UploadPack => write_upload_pack_busy(w, correlation_id),
        }
    }
}

impl fmt::Display for GitOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service())
    }
}

fn load_message(correlation_id: &str) -> String {
    format!("GitLab is currently unable to handle this request due to load (ID {correlation_id}).\n")
}

/// Busy response for a push.
///
/// ```text
/// 0023 \x01 001aunpack server is busy\n 0000     report-status on band 1
/// <len>\x02 GitLab is currently unable ...\n     progress on band 2
/// 0000
/// ```
///
/// Band 1 carries the report-status stream, which has its own pkt-line
/// framing; the client decodes the two length fields independently.
pub fn write_receive_pack_busy<W: Write + ?Sized>(w: &mut W, correlation_id: &str) -> io::Result<()> {
    let mut report = Vec::with_capacity(UNPACK_BUSY.len() + 8);
    write_pkt_line(&mut report, UNPACK_BUSY.as_bytes())?;
    write_flush(&mut report)?;

    write_sideband(w, Band::Data, &report)?;
    write_sideband(w, Band::Progress, load_message(correlation_id).as_bytes())?;
    write_flush(w)
}

/// Busy response for a fetch: a single `ERR` line, which git prints and aborts on.
pub fn write_upload_pack_busy<W: Write + ?Sized>(w: &mut W, correlation_id: &str) -> io::Result<()> {
    let line = format!("ERR {}", load_message(correlation_id));
    write_pkt_line(w, line.as_bytes())
}
