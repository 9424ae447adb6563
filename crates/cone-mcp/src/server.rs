//! MCP tool server.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler};
use tracing::info;

use cone_inference::InferencePipeline;
use cone_models::MODEL_TYPE;

use crate::tools::{
    catalog_result, classify_result, model_info_result, ClassifyArgs, ClassifyBase64Args,
    MatchArgs, ModelInfoReport,
};

pub const SERVER_NAME: &str = "Textile Cone Inspector";

const INSTRUCTIONS: &str = "Classifies textile cone tip images with a YOLOv8 model and \
    matches them against labelled reference images.";

#[derive(Clone)]
pub struct McpServer {
    pipeline: Arc<InferencePipeline>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl McpServer {
    pub fn new(pipeline: Arc<InferencePipeline>) -> Self {
        Self {
            pipeline,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Classify a textile cone tip image using the custom YOLO model.")]
    async fn classify_cone_tip(
        &self,
        Parameters(args): Parameters<ClassifyArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(tool = "classify_cone_tip", image_path = %args.image_path, "Tool call");
        let response = self
            .pipeline
            .classify_image(&args.image_path, args.confidence_threshold)
            .await;
        Ok(classify_result(response))
    }

    #[tool(description = "Classify a textile cone tip from a base64 encoded image.")]
    async fn classify_cone_tip_base64(
        &self,
        Parameters(args): Parameters<ClassifyBase64Args>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(
            tool = "classify_cone_tip_base64",
            payload_len = args.image_base64.len(),
            "Tool call"
        );
        let response = self
            .pipeline
            .classify_from_base64(&args.image_base64, args.confidence_threshold)
            .await;
        Ok(classify_result(response))
    }

    #[tool(description = "List all reference cone tip images available for comparison.")]
    async fn list_reference_images(&self) -> Result<CallToolResult, ErrorData> {
        info!(tool = "list_reference_images", "Tool call");
        Ok(catalog_result(self.pipeline.list_reference_images().await))
    }

    #[tool(
        description = "Classify an image and match it against reference images of the predicted class."
    )]
    async fn match_against_references(
        &self,
        Parameters(args): Parameters<MatchArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(tool = "match_against_references", image_path = %args.image_path, top_k = args.top_k, "Tool call");
        let response = self
            .pipeline
            .match_against_references(&args.image_path, args.top_k)
            .await;
        Ok(classify_result(response))
    }

    #[tool(description = "Get information about the loaded YOLO model.")]
    async fn get_model_info(&self) -> Result<CallToolResult, ErrorData> {
        info!(tool = "get_model_info", "Tool call");
        let report = self.pipeline.model_info().await.map(|info| ModelInfoReport {
            model_path: info.path.clone(),
            model_type: MODEL_TYPE,
            num_classes: info.num_classes(),
            classes: info.classes,
            reference_images_dir: self
                .pipeline
                .config()
                .reference_images_dir
                .display()
                .to_string(),
        });
        Ok(model_info_result(report))
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..ServerInfo::default()
        }
    }
}
