//! Bedrock knowledge-base client

use aws_sdk_bedrockagent::Client as AgentClient;
use aws_sdk_bedrockagentruntime::Client as AgentRuntimeClient;
use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseQuery, KnowledgeBaseRetrievalConfiguration, KnowledgeBaseRetrieveAndGenerateConfiguration,
    KnowledgeBaseVectorSearchConfiguration, RetrieveAndGenerateConfiguration, RetrieveAndGenerateInput,
    RetrieveAndGenerateType,
};

use crate::error::KbError;
use crate::types::{Citation, GeneratedAnswer, KnowledgeBaseSummary, RetrievedSnippet};

/// Client for Bedrock knowledge-base retrieval and management
pub struct KnowledgeBaseService {
    runtime: AgentRuntimeClient,
    agent: AgentClient,
}

impl KnowledgeBaseService {
    /// Create from a resolved SDK configuration
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            runtime: AgentRuntimeClient::new(sdk_config),
            agent: AgentClient::new(sdk_config),
        }
    }

    /// Retrieve the top-k snippets for a query
    pub async fn retrieve(
        &self,
        knowledge_base_id: &str,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<RetrievedSnippet>, KbError> {
        let retrieval_query = KnowledgeBaseQuery::builder().text(query).build();

        let config = KnowledgeBaseRetrievalConfiguration::builder()
            .vector_search_configuration(
                KnowledgeBaseVectorSearchConfiguration::builder()
                    .number_of_results(top_k as i32)
                    .build(),
            )
            .build();

        let output = self
            .runtime
            .retrieve()
            .knowledge_base_id(knowledge_base_id)
            .retrieval_query(retrieval_query)
            .retrieval_configuration(config)
            .send()
            .await
            .map_err(|e| map_sdk_error(knowledge_base_id, &e.into_service_error().to_string()))?;

        let snippets = output
            .retrieval_results()
            .iter()
            .map(|result| RetrievedSnippet {
                text: result
                    .content()
                    .map(|c| c.text().to_owned())
                    .unwrap_or_default(),
                source: result
                    .location()
                    .and_then(|l| l.s3_location())
                    .and_then(|s3| s3.uri())
                    .map(ToOwned::to_owned),
                score: result.score(),
            })
            .filter(|s| !s.text.is_empty())
            .collect();

        Ok(snippets)
    }

    /// Delegate retrieve-and-generate to the provider KB API
    pub async fn retrieve_and_generate(
        &self,
        knowledge_base_id: &str,
        query: &str,
        model_arn: &str,
    ) -> Result<GeneratedAnswer, KbError> {
        let input = RetrieveAndGenerateInput::builder()
            .text(query)
            .build()
            .map_err(|e| KbError::Internal(anyhow::anyhow!("failed to build input: {e}")))?;

        let kb_config = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(knowledge_base_id)
            .model_arn(model_arn)
            .build()
            .map_err(|e| KbError::Internal(anyhow::anyhow!("failed to build KB configuration: {e}")))?;

        let config = RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(kb_config)
            .build()
            .map_err(|e| KbError::Internal(anyhow::anyhow!("failed to build configuration: {e}")))?;

        let output = self
            .runtime
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(config)
            .send()
            .await
            .map_err(|e| map_sdk_error(knowledge_base_id, &e.into_service_error().to_string()))?;

        let text = output.output().map(|o| o.text().to_owned()).unwrap_or_default();

        let citations = output
            .citations()
            .iter()
            .flat_map(|citation| citation.retrieved_references())
            .map(|reference| Citation {
                source: reference
                    .location()
                    .and_then(|l| l.s3_location())
                    .and_then(|s3| s3.uri())
                    .map(ToOwned::to_owned),
                excerpt: reference.content().map(|c| c.text().to_owned()),
            })
            .collect();

        Ok(GeneratedAnswer { text, citations })
    }

    /// List configured knowledge bases
    pub async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBaseSummary>, KbError> {
        let output = self
            .agent
            .list_knowledge_bases()
            .send()
            .await
            .map_err(|e| map_sdk_error("", &e.into_service_error().to_string()))?;

        Ok(output
            .knowledge_base_summaries()
            .iter()
            .map(|summary| KnowledgeBaseSummary {
                id: summary.knowledge_base_id().to_owned(),
                name: summary.name().to_owned(),
                description: summary.description().map(ToOwned::to_owned),
                status: summary.status().to_string(),
            })
            .collect())
    }

    /// Fetch one knowledge base's metadata
    pub async fn get_knowledge_base(&self, knowledge_base_id: &str) -> Result<KnowledgeBaseSummary, KbError> {
        let output = self
            .agent
            .get_knowledge_base()
            .knowledge_base_id(knowledge_base_id)
            .send()
            .await
            .map_err(|e| map_sdk_error(knowledge_base_id, &e.into_service_error().to_string()))?;

        let kb = output.knowledge_base().ok_or_else(|| KbError::NotFound {
            knowledge_base_id: knowledge_base_id.to_owned(),
        })?;

        Ok(KnowledgeBaseSummary {
            id: kb.knowledge_base_id().to_owned(),
            name: kb.name().to_owned(),
            description: kb.description().map(ToOwned::to_owned),
            status: kb.status().to_string(),
        })
    }

    /// Delete a knowledge base
    pub async fn delete_knowledge_base(&self, knowledge_base_id: &str) -> Result<(), KbError> {
        self.agent
            .delete_knowledge_base()
            .knowledge_base_id(knowledge_base_id)
            .send()
            .await
            .map_err(|e| map_sdk_error(knowledge_base_id, &e.into_service_error().to_string()))?;
        Ok(())
    }
}

/// Classify an SDK error message onto the KB taxonomy
fn map_sdk_error(knowledge_base_id: &str, message: &str) -> KbError {
    if message.contains("ThrottlingException") {
        return KbError::Throttled;
    }
    if message.contains("AccessDeniedException") {
        return KbError::AccessDenied(message.to_owned());
    }
    if message.contains("ResourceNotFoundException") {
        return KbError::NotFound {
            knowledge_base_id: knowledge_base_id.to_owned(),
        };
    }
    KbError::Service(message.to_owned())
}
