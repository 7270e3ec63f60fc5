use anyhow::Result;
use tracing::{info, warn};

use crate::cli::ListArgs;
use crate::corpus;

pub fn run(args: ListArgs) -> Result<()> {
    let domains = corpus::discover_domains(&args.tests_root)?;

    if domains.is_empty() {
        warn!(root = %args.tests_root.display(), "no domains found under tests root");
        return Ok(());
    }

    for name in &domains {
        match corpus::load_domain(&args.tests_root, name) {
            Ok(domain) => {
                let labeled = domain
                    .cases
                    .iter()
                    .filter(|case| case.expected_literal.is_some())
                    .count();
                info!(
                    domain = %domain.name,
                    cases = domain.cases.len(),
                    literals = domain.literals.len(),
                    retrieval_labels = labeled,
                    "domain ready"
                );
            }
            Err(fault) => {
                warn!(domain = %name, fault = %fault, "domain failed to load");
            }
        }
    }

    info!(domains = domains.len(), root = %args.tests_root.display(), "inventory completed");

    Ok(())
}
