use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::identity::BuilderWorkflowRef;
use crate::in_toto::{DigestSet, Statement, make_minimal_subject};
use crate::slsa::{
    BUILD_CONFIG_VERSION, Builder, ConfigSource, Environment, GO_BUILDER_BUILD_TYPE, Invocation,
    Material, PARAMETERS_VERSION, PROVENANCE_PREDICATE_TYPE_V02, Parameters, ProvenanceBuildConfig,
    ProvenancePredicate, ProvenanceStatement, ProvenanceStep,
};

/// Hosted runner facts recorded in the invocation environment.
const RUNNER_ARCH: &str = "amd64";
const RUNNER_OS: &str = "ubuntu";

/// A sha256 digest is exactly 64 hex characters.
pub fn verify_digest(digest: &str) -> Result<()> {
    if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(Error::InvalidDigest(digest.to_string()))
    }
}

/// The binary name ends up in an output filename: letters, digits, `-`, `_`.
pub fn verify_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidName("empty provenance name".to_string()));
    }

    match name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some(c) => Err(Error::InvalidName(format!("found character '{c}' in {name}"))),
        None => Ok(()),
    }
}

fn sha1_digest(sha: &str) -> DigestSet {
    DigestSet::from([("sha1".to_string(), sha.to_string())])
}

pub fn make_builder(workflow_ref: &BuilderWorkflowRef) -> Builder {
    Builder {
        id: workflow_ref.builder_id(),
    }
}

pub fn make_invocation(ctx: &RunContext) -> Invocation {
    Invocation {
        config_source: ConfigSource {
            uri: format!("{}@{}.git", ctx.repository_uri(), ctx.git_ref),
            digest: sha1_digest(&ctx.sha),
            entry_point: ctx.workflow.clone(),
        },
        parameters: Parameters {
            version: PARAMETERS_VERSION,
            event_name: ctx.event_name.clone(),
            event_payload: ctx.event.clone(),
            ref_type: ctx.ref_type.clone(),
            git_ref: ctx.git_ref.clone(),
            base_ref: ctx.base_ref.clone(),
            head_ref: ctx.head_ref.clone(),
            actor: ctx.actor.clone(),
            sha1: ctx.sha.clone(),
        },
        environment: Environment {
            arch: RUNNER_ARCH.to_string(),
            github_event_name: ctx.event_name.clone(),
            github_run_attempt: ctx.run_attempt.clone(),
            github_run_id: ctx.run_id.clone(),
            github_run_number: ctx.run_number.clone(),
            os: RUNNER_OS.to_string(),
        },
    }
}

pub fn make_materials(ctx: &RunContext) -> Vec<Material> {
    vec![Material {
        uri: format!("{}.git", ctx.repository_uri()),
        digest: sha1_digest(&ctx.sha),
    }]
}

/// Build the unsigned provenance statement for one compiled binary.
///
/// `binary_name` and `sha256_digest` are untrusted and validated here. The
/// builder identity comes only from `workflow_ref`, which can only be
/// obtained from the identity token exchange.
///
/// # Arguments
///
/// * `binary_name` - Name of the built binary, recorded as the statement subject
/// * `sha256_digest` - Hex-encoded SHA-256 of the binary
/// * `ctx` - The scrubbed workflow run context
/// * `workflow_ref` - The reusable workflow that performed the build
/// * `command` - The resolved compiler invocation
/// * `env` - The resolved `NAME=VALUE` environment
///
/// # Returns
///
/// An in-toto v0.1 statement with a SLSA v0.2 predicate. Serializing the
/// same inputs always yields the same bytes.
///
/// # Errors
///
/// - [`Error::InvalidDigest`] if the digest is not 64 hex characters
/// - [`Error::InvalidName`] if the name is empty or contains anything other
///   than ASCII letters, digits, `-` and `_`
pub fn generate_provenance_statement(
    binary_name: &str,
    sha256_digest: &str,
    ctx: &RunContext,
    workflow_ref: &BuilderWorkflowRef,
    command: Vec<String>,
    env: Vec<String>,
) -> Result<ProvenanceStatement> {
    verify_digest(sha256_digest)?;
    verify_name(binary_name)?;

    let predicate = ProvenancePredicate {
        builder: make_builder(workflow_ref),
        build_type: GO_BUILDER_BUILD_TYPE.to_string(),
        invocation: make_invocation(ctx),
        build_config: ProvenanceBuildConfig {
            version: BUILD_CONFIG_VERSION,
            steps: vec![ProvenanceStep { command, env }],
        },
        materials: make_materials(ctx),
    };

    Ok(Statement::new(
        vec![make_minimal_subject(binary_name, "sha256", sha256_digest)],
        PROVENANCE_PREDICATE_TYPE_V02,
        predicate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::{DIGEST, WORKFLOW_REF, run_context};

    fn statement_bytes() -> Vec<u8> {
        generate_provenance_statement(
            "app-linux_amd64",
            DIGEST,
            &run_context(),
            &BuilderWorkflowRef::new(WORKFLOW_REF),
            vec!["/usr/bin/go".to_string(), "build".to_string()],
            vec!["CGO_ENABLED=0".to_string()],
        )
        .unwrap()
        .to_bytes()
        .unwrap()
    }

    #[test]
    fn test_verify_digest() {
        assert!(verify_digest(DIGEST).is_ok());
        assert!(verify_digest(&"A".repeat(64)).is_ok());

        let bad_digests = vec![
            String::new(),
            "abc".to_string(),
            "a".repeat(63),
            "a".repeat(65),
            "g".repeat(64),
            format!("{} ", "a".repeat(63)),
        ];
        for bad in &bad_digests {
            assert!(
                matches!(verify_digest(bad), Err(Error::InvalidDigest(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_verify_name() {
        for ok in ["app", "App-1_linux", "0", "BINARY"] {
            assert!(verify_name(ok).is_ok(), "{ok} should be accepted");
        }

        for bad in ["", "../etc/passwd", "app.exe", "a b", "app/x", "é", "a\0"] {
            assert!(
                matches!(verify_name(bad), Err(Error::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_statement_is_deterministic() {
        assert_eq!(statement_bytes(), statement_bytes());
    }

    #[test]
    fn test_statement_content() {
        let value: serde_json::Value = serde_json::from_slice(&statement_bytes()).unwrap();

        assert_eq!(value["_type"], "https://in-toto.io/Statement/v0.1");
        assert_eq!(value["predicateType"], PROVENANCE_PREDICATE_TYPE_V02);
        assert_eq!(value["subject"][0]["name"], "app-linux_amd64");
        assert_eq!(value["subject"][0]["digest"]["sha256"], DIGEST);

        let predicate = &value["predicate"];
        assert_eq!(predicate["buildType"], GO_BUILDER_BUILD_TYPE);
        assert_eq!(
            predicate["builder"]["id"],
            format!("https://github.com/{WORKFLOW_REF}")
        );

        let source = &predicate["invocation"]["configSource"];
        assert_eq!(
            source["uri"],
            "git+https://github.com/octo-org/octo-repo@refs/tags/v1.0.0.git"
        );
        assert_eq!(source["entryPoint"], "release");
        assert_eq!(
            source["digest"]["sha1"],
            "0123456789abcdef0123456789abcdef01234567"
        );

        let params = &predicate["invocation"]["parameters"];
        assert_eq!(params["version"], 1);
        assert_eq!(params["ref"], "refs/tags/v1.0.0");
        assert_eq!(params["actor"], "octocat");
        assert_eq!(params["event_payload"]["head_commit"]["id"], "abc");

        let env = &predicate["invocation"]["environment"];
        assert_eq!(env["github_run_id"], "1234567890");
        assert_eq!(env["arch"], "amd64");

        let steps = predicate["buildConfig"]["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0]["command"][1], "build");
        assert_eq!(steps[0]["env"][0], "CGO_ENABLED=0");

        assert_eq!(
            predicate["materials"][0]["uri"],
            "git+https://github.com/octo-org/octo-repo.git"
        );
    }

    #[test]
    fn test_statement_has_no_token() {
        let text = String::from_utf8(statement_bytes()).unwrap();
        assert!(!text.contains("ghs_"));
        assert!(!text.contains("token"));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let ctx = run_context();
        let wf = BuilderWorkflowRef::new(WORKFLOW_REF);

        let result = generate_provenance_statement("app", "1234", &ctx, &wf, vec![], vec![]);
        assert!(matches!(result, Err(Error::InvalidDigest(_))));

        let result = generate_provenance_statement("../app", DIGEST, &ctx, &wf, vec![], vec![]);
        assert!(matches!(result, Err(Error::InvalidName(_))));
    }
}
