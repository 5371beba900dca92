use crate::analysis::patterns::body_statements;
use crate::analysis::find_all;
use crate::core::{DetectorDefinition, Hit, Severity};
use crate::representations::{SourceFile, SyntaxNode};
use anyhow::Result;

pub fn definition() -> DetectorDefinition {
    DetectorDefinition::structural(
        "hardcoded-token-uri",
        "tokenURI returns a hardcoded URI",
        "The `tokenURI` function returns a fixed URI without checking that the token exists or deriving the URI from the token id.",
        Severity::Low,
        detect,
    )
}

const URI_SCHEMES: [&str; 3] = ["http", "ipfs://", "ar://"];

fn returns_uri_literal(statement: &SyntaxNode) -> bool {
    if !statement.is("Return") {
        return false;
    }
    statement
        .child("expression")
        .filter(|e| e.is("Literal") && e.str_attr("kind") == Some("string"))
        .and_then(|e| e.str_attr("value"))
        .map_or(false, |value| URI_SCHEMES.iter().any(|scheme| value.starts_with(scheme)))
}

fn detect(file: &SourceFile) -> Result<Vec<Hit>> {
    let Some(root) = file.tree() else {
        return Ok(Vec::new());
    };

    let mut hits = Vec::new();
    for func in find_all("FunctionDefinition", root) {
        let func = func?;
        if func.str_attr("name") == Some("tokenURI")
            && body_statements(func).into_iter().any(returns_uri_literal)
        {
            hits.push(Hit::new(func.src()));
        }
    }

    Ok(hits)
}
