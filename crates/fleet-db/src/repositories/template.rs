use fleet_types::common::{BlockingType, ParameterValueType};
use fleet_types::template::{
    ActionParameterTemplate, ActionTemplate, EdgeTemplate, NodeTemplate, NodeTemplatePose,
    OrderTemplate, ResolvedActionTemplate, ResolvedEdgeTemplate, ResolvedNodeTemplate,
    ResolvedOrderTemplate,
};
use sqlx::{PgPool, Row};
use std::str::FromStr;

use crate::error::{RepoError, Result};
use crate::uow::Tx;

/// Repository for the order template domain (spec §3, §4.7 step 1: "resolve
/// by id lookup, not intrusive object references").
pub struct TemplateRepository;

impl TemplateRepository {
    pub async fn create_action_template(
        tx: &mut Tx,
        action_type: &str,
        action_id: Option<&str>,
        blocking_type: BlockingType,
        description: Option<&str>,
    ) -> Result<u64> {
        let row = sqlx::query(
            r#"
            INSERT INTO action_templates (action_type, action_id, blocking_type, action_description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(action_type)
        .bind(action_id)
        .bind(blocking_type.to_string())
        .bind(description)
        .fetch_one(&mut *tx.connection())
        .await?;
        Ok(row.try_get::<i64, _>("id")? as u64)
    }

    pub async fn add_action_parameter(
        tx: &mut Tx,
        action_template_id: u64,
        key: &str,
        value: &str,
        value_type: ParameterValueType,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO action_parameter_templates (action_template_id, key, value, value_type)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(action_template_id as i64)
        .bind(key)
        .bind(value)
        .bind(value_type.to_string())
        .execute(&mut *tx.connection())
        .await?;
        Ok(())
    }

    pub async fn create_node_template(tx: &mut Tx, node: &NodeTemplate) -> Result<u64> {
        let row = sqlx::query(
            r#"
            INSERT INTO node_templates
                (node_id, name, description, sequence_id, released,
                 pose_x, pose_y, pose_theta, pose_allowed_deviation_xy, pose_allowed_deviation_theta, pose_map_id,
                 action_template_ids)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(&node.node_id)
        .bind(&node.name)
        .bind(&node.description)
        .bind(node.sequence_id)
        .bind(node.released)
        .bind(node.pose.x)
        .bind(node.pose.y)
        .bind(node.pose.theta)
        .bind(node.pose.allowed_deviation_xy)
        .bind(node.pose.allowed_deviation_theta)
        .bind(&node.pose.map_id)
        .bind(serde_json::to_value(&node.action_template_ids)?)
        .fetch_one(&mut *tx.connection())
        .await?;
        Ok(row.try_get::<i64, _>("id")? as u64)
    }

    pub async fn create_edge_template(tx: &mut Tx, edge: &EdgeTemplate) -> Result<u64> {
        let row = sqlx::query(
            r#"
            INSERT INTO edge_templates
                (edge_id, name, description, sequence_id, released, start_node_id, end_node_id, action_template_ids)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&edge.edge_id)
        .bind(&edge.name)
        .bind(&edge.description)
        .bind(edge.sequence_id)
        .bind(edge.released)
        .bind(&edge.start_node_id)
        .bind(&edge.end_node_id)
        .bind(serde_json::to_value(&edge.action_template_ids)?)
        .fetch_one(&mut *tx.connection())
        .await?;
        Ok(row.try_get::<i64, _>("id")? as u64)
    }

    pub async fn create_order_template(
        tx: &mut Tx,
        name: &str,
        description: Option<&str>,
        node_ids: &[u64],
        edge_ids: &[u64],
    ) -> Result<u64> {
        let row = sqlx::query("INSERT INTO order_templates (name, description) VALUES ($1, $2) RETURNING id")
            .bind(name)
            .bind(description)
            .fetch_one(&mut *tx.connection())
            .await?;
        let order_template_id: i64 = row.try_get("id")?;

        for node_id in node_ids {
            sqlx::query("INSERT INTO order_template_nodes (order_template_id, node_template_id) VALUES ($1, $2)")
                .bind(order_template_id)
                .bind(*node_id as i64)
                .execute(&mut *tx.connection())
                .await?;
        }
        for edge_id in edge_ids {
            sqlx::query("INSERT INTO order_template_edges (order_template_id, edge_template_id) VALUES ($1, $2)")
                .bind(order_template_id)
                .bind(*edge_id as i64)
                .execute(&mut *tx.connection())
                .await?;
        }

        Ok(order_template_id as u64)
    }

    pub async fn list_order_templates(pool: &PgPool) -> Result<Vec<OrderTemplate>> {
        let rows = sqlx::query("SELECT * FROM order_templates ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(OrderTemplate {
                    id: row.try_get::<i64, _>("id")? as u64,
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                })
            })
            .collect()
    }

    async fn load_action_templates(pool: &PgPool, ids: &[u64]) -> Result<Vec<ResolvedActionTemplate>> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query("SELECT * FROM action_templates WHERE id = $1")
                .bind(*id as i64)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| RepoError::EntityNotFound(format!("action template {id}")))?;
            let blocking_str: String = row.try_get("blocking_type")?;
            let template = ActionTemplate {
                id: *id,
                action_type: row.try_get("action_type")?,
                action_id: row.try_get("action_id")?,
                blocking_type: BlockingType::from_str(&blocking_str).map_err(RepoError::ValidationError)?,
                action_description: row.try_get("action_description")?,
            };

            let param_rows = sqlx::query("SELECT * FROM action_parameter_templates WHERE action_template_id = $1 ORDER BY id")
                .bind(*id as i64)
                .fetch_all(pool)
                .await?;
            let parameters = param_rows
                .into_iter()
                .map(|r| -> Result<ActionParameterTemplate> {
                    let value_type_str: String = r.try_get("value_type")?;
                    Ok(ActionParameterTemplate {
                        id: r.try_get::<i64, _>("id")? as u64,
                        action_template_id: r.try_get::<i64, _>("action_template_id")? as u64,
                        key: r.try_get("key")?,
                        value: r.try_get("value")?,
                        value_type: ParameterValueType::from_str(&value_type_str)
                            .map_err(RepoError::ValidationError)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            out.push(ResolvedActionTemplate { template, parameters });
        }
        Ok(out)
    }

    /// Loads an `OrderTemplate` joined with all of its member nodes, edges
    /// and the action templates each references, resolved by id (spec §4.7
    /// step 1).
    pub async fn load_order(pool: &PgPool, order_template_id: u64) -> Result<ResolvedOrderTemplate> {
        let ot_row = sqlx::query("SELECT * FROM order_templates WHERE id = $1")
            .bind(order_template_id as i64)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| RepoError::EntityNotFound(format!("order template {order_template_id}")))?;
        let order_template = OrderTemplate {
            id: order_template_id,
            name: ot_row.try_get("name")?,
            description: ot_row.try_get("description")?,
        };

        let node_rows = sqlx::query(
            r#"
            SELECT nt.* FROM node_templates nt
            JOIN order_template_nodes otn ON otn.node_template_id = nt.id
            WHERE otn.order_template_id = $1
            ORDER BY nt.sequence_id
            "#,
        )
        .bind(order_template_id as i64)
        .fetch_all(pool)
        .await?;

        let mut nodes = Vec::with_capacity(node_rows.len());
        for row in node_rows {
            let action_ids: Vec<u64> = serde_json::from_value(row.try_get("action_template_ids")?)?;
            let node = NodeTemplate {
                id: row.try_get::<i64, _>("id")? as u64,
                node_id: row.try_get("node_id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                sequence_id: row.try_get("sequence_id")?,
                released: row.try_get("released")?,
                pose: NodeTemplatePose {
                    x: row.try_get("pose_x")?,
                    y: row.try_get("pose_y")?,
                    theta: row.try_get("pose_theta")?,
                    allowed_deviation_xy: row.try_get("pose_allowed_deviation_xy")?,
                    allowed_deviation_theta: row.try_get("pose_allowed_deviation_theta")?,
                    map_id: row.try_get("pose_map_id")?,
                },
                action_template_ids: action_ids.clone(),
            };
            let actions = Self::load_action_templates(pool, &action_ids).await?;
            nodes.push(ResolvedNodeTemplate { node, actions });
        }

        let edge_rows = sqlx::query(
            r#"
            SELECT et.* FROM edge_templates et
            JOIN order_template_edges ote ON ote.edge_template_id = et.id
            WHERE ote.order_template_id = $1
            ORDER BY et.sequence_id
            "#,
        )
        .bind(order_template_id as i64)
        .fetch_all(pool)
        .await?;

        let mut edges = Vec::with_capacity(edge_rows.len());
        for row in edge_rows {
            let action_ids: Vec<u64> = serde_json::from_value(row.try_get("action_template_ids")?)?;
            let edge = EdgeTemplate {
                id: row.try_get::<i64, _>("id")? as u64,
                edge_id: row.try_get("edge_id")?,
                name: row.try_get("name")?,
                description: row.try_get("description")?,
                sequence_id: row.try_get("sequence_id")?,
                released: row.try_get("released")?,
                start_node_id: row.try_get("start_node_id")?,
                end_node_id: row.try_get("end_node_id")?,
                action_template_ids: action_ids.clone(),
            };
            let actions = Self::load_action_templates(pool, &action_ids).await?;
            edges.push(ResolvedEdgeTemplate { edge, actions });
        }

        Ok(ResolvedOrderTemplate {
            order_template,
            nodes,
            edges,
        })
    }

    pub async fn delete_order_template(tx: &mut Tx, order_template_id: u64) -> Result<()> {
        let result = sqlx::query("DELETE FROM order_templates WHERE id = $1")
            .bind(order_template_id as i64)
            .execute(&mut *tx.connection())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::EntityNotFound(format!(
                "order template {order_template_id}"
            )));
        }
        Ok(())
    }

    pub async fn list_action_templates(pool: &PgPool) -> Result<Vec<ResolvedActionTemplate>> {
        let rows = sqlx::query("SELECT id FROM action_templates ORDER BY id")
            .fetch_all(pool)
            .await?;
        let ids: Vec<u64> = rows
            .into_iter()
            .map(|r| r.try_get::<i64, _>("id").map(|id| id as u64))
            .collect::<std::result::Result<_, _>>()?;
        Self::load_action_templates(pool, &ids).await
    }

    pub async fn get_action_template(pool: &PgPool, id: u64) -> Result<ResolvedActionTemplate> {
        Self::load_action_templates(pool, &[id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::EntityNotFound(format!("action template {id}")))
    }

    pub async fn delete_action_template(tx: &mut Tx, id: u64) -> Result<()> {
        let result = sqlx::query("DELETE FROM action_templates WHERE id = $1")
            .bind(id as i64)
            .execute(&mut *tx.connection())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::EntityNotFound(format!("action template {id}")));
        }
        Ok(())
    }

    fn row_to_node_template(row: &sqlx::postgres::PgRow) -> Result<NodeTemplate> {
        let action_ids: Vec<u64> = serde_json::from_value(row.try_get("action_template_ids")?)?;
        Ok(NodeTemplate {
            id: row.try_get::<i64, _>("id")? as u64,
            node_id: row.try_get("node_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            sequence_id: row.try_get("sequence_id")?,
            released: row.try_get("released")?,
            pose: NodeTemplatePose {
                x: row.try_get("pose_x")?,
                y: row.try_get("pose_y")?,
                theta: row.try_get("pose_theta")?,
                allowed_deviation_xy: row.try_get("pose_allowed_deviation_xy")?,
                allowed_deviation_theta: row.try_get("pose_allowed_deviation_theta")?,
                map_id: row.try_get("pose_map_id")?,
            },
            action_template_ids: action_ids,
        })
    }

    pub async fn list_node_templates(pool: &PgPool) -> Result<Vec<NodeTemplate>> {
        let rows = sqlx::query("SELECT * FROM node_templates ORDER BY id")
            .fetch_all(pool)
            .await?;
        rows.iter().map(Self::row_to_node_template).collect()
    }

    pub async fn get_node_template(pool: &PgPool, id: u64) -> Result<NodeTemplate> {
        let row = sqlx::query("SELECT * FROM node_templates WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| RepoError::EntityNotFound(format!("node template {id}")))?;
        Self::row_to_node_template(&row)
    }

    pub async fn delete_node_template(tx: &mut Tx, id: u64) -> Result<()> {
        let result = sqlx::query("DELETE FROM node_templates WHERE id = $1")
            .bind(id as i64)
            .execute(&mut *tx.connection())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::EntityNotFound(format!("node template {id}")));
        }
        Ok(())
    }

    fn row_to_edge_template(row: &sqlx::postgres::PgRow) -> Result<EdgeTemplate> {
        let action_ids: Vec<u64> = serde_json::from_value(row.try_get("action_template_ids")?)?;
        Ok(EdgeTemplate {
            id: row.try_get::<i64, _>("id")? as u64,
            edge_id: row.try_get("edge_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            sequence_id: row.try_get("sequence_id")?,
            released: row.try_get("released")?,
            start_node_id: row.try_get("start_node_id")?,
            end_node_id: row.try_get("end_node_id")?,
            action_template_ids: action_ids,
        })
    }

    pub async fn list_edge_templates(pool: &PgPool) -> Result<Vec<EdgeTemplate>> {
        let rows = sqlx::query("SELECT * FROM edge_templates ORDER BY id")
            .fetch_all(pool)
            .await?;
        rows.iter().map(Self::row_to_edge_template).collect()
    }

    pub async fn get_edge_template(pool: &PgPool, id: u64) -> Result<EdgeTemplate> {
        let row = sqlx::query("SELECT * FROM edge_templates WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| RepoError::EntityNotFound(format!("edge template {id}")))?;
        Self::row_to_edge_template(&row)
    }

    pub async fn delete_edge_template(tx: &mut Tx, id: u64) -> Result<()> {
        let result = sqlx::query("DELETE FROM edge_templates WHERE id = $1")
            .bind(id as i64)
            .execute(&mut *tx.connection())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::EntityNotFound(format!("edge template {id}")));
        }
        Ok(())
    }
}
