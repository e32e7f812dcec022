use std::sync::Arc;
use studyplan_lib::config::{get_engine_config, EngineConfig};
use studyplan_lib::content::OllamaContentSource;
use studyplan_lib::curriculum::ConceptGraph;
use studyplan_lib::logging;
use studyplan_lib::plan::{PlanInput, PlanStrategy, StudyPlan};
use studyplan_lib::store::FileStore;
use studyplan_lib::{PlanError, StudyEngine};

const USAGE: &str = "usage: studyplan <plan-input.json> [--json] [--agent]";

fn load_curriculum() -> Result<ConceptGraph, PlanError> {
    match std::env::var_os("STUDYPLAN_CURRICULUM") {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| PlanError::from(e).with_context(format!("reading curriculum {:?}", path)))?;
            let graph = ConceptGraph::from_toml_str(&content)?;
            tracing::info!(path = ?path, concepts = graph.len(), "Curriculum loaded");
            Ok(graph)
        }
        None => Ok(ConceptGraph::default()),
    }
}

/// Run the full pipeline as a job with content from the configured Ollama
/// server. Falls back to curated tasks when the server is unreachable.
fn build_with_agent(
    store: FileStore,
    graph: ConceptGraph,
    config: EngineConfig,
    mut input: PlanInput,
) -> Result<(StudyPlan, String), PlanError> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        PlanError::stage_failed(format!("Failed to create async runtime: {}", e), "startup")
    })?;
    let source = OllamaContentSource::new(config.content.clone())?;
    let engine = StudyEngine::with_content(Arc::new(store), graph, config, Arc::new(source));
    input.strategy = PlanStrategy::Agent;

    let plan = runtime.block_on(async {
        let job_id = engine.start_plan_job(input)?;
        tracing::info!(job_id = %job_id, "Plan job started");
        engine.await_job(&job_id).await
    })?;
    let checklist = engine.render_checklist(&plan);
    Ok((plan, checklist))
}

fn run() -> Result<(), PlanError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let input_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .ok_or_else(|| PlanError::validation(USAGE))?;
    let as_json = args.iter().any(|a| a == "--json");
    let agent = args.iter().any(|a| a == "--agent");

    let config = get_engine_config().clone();
    let store = FileStore::open(config.data_dir())?;
    tracing::info!(path = ?store.path(), "Datastore opened");

    let raw = std::fs::read_to_string(input_path)
        .map_err(|e| PlanError::from(e).with_context(format!("reading plan input {}", input_path)))?;
    let input: PlanInput = serde_json::from_str(&raw)
        .map_err(|e| PlanError::validation(format!("invalid plan input: {}", e)))?;
    let graph = load_curriculum()?;

    let (plan, checklist) = if agent {
        build_with_agent(store, graph, config, input)?
    } else {
        let engine = StudyEngine::new(Arc::new(store), graph, config);
        let plan = engine.build_plan(input)?;
        let checklist = engine.render_checklist(&plan);
        (plan, checklist)
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", checklist);
    }
    Ok(())
}

fn main() {
    logging::init_logging_with("warn");
    tracing::info!("studyplan starting");

    if let Err(e) = run() {
        tracing::error!(kind = e.kind.as_str(), error = %e, "studyplan failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
