use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no candidates registered for capability '{0}' in any manifest source")]
    MissingCapability(String),
    #[error("manifest source '{source_name}' line {line}: {reason}")]
    MalformedManifest {
        source_name: String,
        line: usize,
        reason: String,
    },
    #[error("failed to read manifest '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "the following identifiers cannot be excluded because they are not candidates:{}",
        bullet_list(.0)
    )]
    InvalidExcludes(Vec<String>),
    #[error("candidate filter '{filter}' failed: {reason}")]
    Filter { filter: String, reason: String },
}

fn bullet_list(ids: &[String]) -> String {
    let mut out = String::new();
    for id in ids {
        out.push_str("\n\t- ");
        out.push_str(id);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_excludes_lists_every_offender() {
        let err = ResolveError::InvalidExcludes(vec!["a".into(), "b".into()]);
        let msg = err.to_string();
        assert!(msg.contains("\n\t- a"), "unexpected message: {msg}");
        assert!(msg.contains("\n\t- b"), "unexpected message: {msg}");
    }
}
