pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::cover_letters::handlers as cover_letters;
use crate::documents::handlers as documents;
use crate::generation::handlers as generation;
use crate::jobs::handlers as jobs;
use crate::retrieval::handlers as retrieval;
use crate::state::AppState;
use crate::vector_store::handlers as vector_store;

/// Upper bound on request bodies; resumes and postings arrive as PDF uploads.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        // Documents and job postings
        .route("/upload-pdf", post(documents::handle_upload_pdf))
        .route("/api/upload-pdf", post(documents::handle_upload_pdf))
        .route("/submit-job-posting", post(jobs::handle_submit))
        .route("/upload-job-posting", post(jobs::handle_upload))
        .route("/job-postings", get(jobs::handle_list))
        .route("/job-postings/:id", get(jobs::handle_get))
        // Vector store
        .route("/vector-store/stats", get(vector_store::handle_stats))
        .route(
            "/vector-store/:collection",
            delete(vector_store::handle_reset),
        )
        .route("/search", post(vector_store::handle_search))
        .route("/search/all", post(retrieval::handle_search_all))
        .route(
            "/generate-embeddings",
            post(vector_store::handle_generate_embeddings),
        )
        // Generation
        .route("/generate-cover-letter", post(generation::handle_generate))
        .route("/api/generate-cover-letter", post(generation::handle_generate))
        .route(
            "/generate-cover-letter/batch",
            post(generation::handle_batch_generate),
        )
        .route(
            "/analyze-job-posting",
            post(generation::handle_analyze_job_posting),
        )
        .route(
            "/analyze-and-generate",
            post(generation::handle_analyze_and_generate),
        )
        .route("/pipeline/stats", get(generation::handle_pipeline_stats))
        // Cover letter editing
        .route("/cover-letter/save", post(cover_letters::handle_save))
        .route("/cover-letter/versions", get(cover_letters::handle_list))
        .route(
            "/cover-letter/:id",
            get(cover_letters::handle_get).delete(cover_letters::handle_delete),
        )
        .route(
            "/cover-letter/:id/section",
            put(cover_letters::handle_update_section),
        )
        .route(
            "/cover-letter/:id/save-all",
            put(cover_letters::handle_save_all),
        )
        .route(
            "/cover-letter/:id/save-status",
            get(cover_letters::handle_save_status),
        )
        .route(
            "/cover-letter/:id/section/:name/history",
            get(cover_letters::handle_section_history),
        )
        .route(
            "/cover-letter/:id/section/:name/version",
            post(cover_letters::handle_checkpoint_section),
        )
        .route(
            "/cover-letter/:id/section/:name/revert",
            post(cover_letters::handle_revert_section),
        )
        .route(
            "/cover-letter/:id/section/:name/update-with-description",
            put(cover_letters::handle_update_section_by_path),
        )
        // Debug
        .route(
            "/debug/pdf-contents",
            get(vector_store::handle_debug_pdf_contents),
        )
        .route(
            "/debug/vector-store-stats",
            get(vector_store::handle_debug_stats),
        )
        .route(
            "/debug/test-retrieval",
            post(retrieval::handle_test_retrieval),
        )
        .route(
            "/debug/context-analysis",
            post(retrieval::handle_context_analysis),
        )
        .route("/api/debug-context", post(retrieval::handle_debug_context))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
