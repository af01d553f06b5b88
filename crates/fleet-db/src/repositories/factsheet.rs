use fleet_types::entity::{
    AgvAction, AgvActionParameter, AgvActionWithParameters, Factsheet, PhysicalParameter,
    TypeSpecification,
};
use fleet_types::message::FactsheetMessage;
use sqlx::{PgPool, Row};

use crate::error::{RepoError, Result};
use crate::uow::Tx;

/// Repository for AGV capability data (spec §3, §4.4). Factsheets are
/// replaced wholesale on every inbound `factsheet` message: there is no
/// partial-update path, so the simplest correct strategy is delete-then-
/// insert inside one transaction.
pub struct FactsheetRepository;

impl FactsheetRepository {
    pub async fn save_or_update(tx: &mut Tx, msg: &FactsheetMessage) -> Result<()> {
        let serial = &msg.serial_number;

        sqlx::query(
            "DELETE FROM agv_action_parameters WHERE agv_action_id IN (SELECT id FROM agv_actions WHERE serial = $1)",
        )
        .bind(serial)
        .execute(&mut *tx.connection())
        .await?;
        sqlx::query("DELETE FROM agv_actions WHERE serial = $1")
            .bind(serial)
            .execute(&mut *tx.connection())
            .await?;
        sqlx::query("DELETE FROM physical_parameters WHERE serial = $1")
            .bind(serial)
            .execute(&mut *tx.connection())
            .await?;
        sqlx::query("DELETE FROM type_specifications WHERE serial = $1")
            .bind(serial)
            .execute(&mut *tx.connection())
            .await?;

        let pp = &msg.physical_parameters;
        sqlx::query(
            r#"
            INSERT INTO physical_parameters
                (serial, accel_max, decel_max, height_min, height_max, length, width, speed_min, speed_max)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(serial)
        .bind(pp.accel_max)
        .bind(pp.decel_max)
        .bind(pp.height_min)
        .bind(pp.height_max)
        .bind(pp.length)
        .bind(pp.width)
        .bind(pp.speed_min)
        .bind(pp.speed_max)
        .execute(&mut *tx.connection())
        .await?;

        let ts = &msg.type_specification;
        sqlx::query(
            r#"
            INSERT INTO type_specifications
                (serial, agv_class, kinematics, localization_types, navigation_types, max_load_mass, series_name, series_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(serial)
        .bind(&ts.agv_class)
        .bind(&ts.agv_kinematic)
        .bind(serde_json::to_value(&ts.localization_types)?)
        .bind(serde_json::to_value(&ts.navigation_types)?)
        .bind(ts.max_load_mass)
        .bind(&ts.series_name)
        .bind(&ts.series_description)
        .execute(&mut *tx.connection())
        .await?;

        for action in &msg.protocol_features.agv_actions {
            let row = sqlx::query(
                r#"
                INSERT INTO agv_actions (serial, action_type, description, action_scopes, result_description)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(serial)
            .bind(&action.action_type)
            .bind(&action.description)
            .bind(serde_json::to_value(&action.action_scopes)?)
            .bind(&action.result_description)
            .fetch_one(&mut *tx.connection())
            .await?;
            let action_id: i64 = row.try_get("id")?;

            for param in &action.action_parameters {
                sqlx::query(
                    r#"
                    INSERT INTO agv_action_parameters (agv_action_id, key, description, is_optional, value_data_type)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(action_id)
                .bind(&param.key)
                .bind(&param.description)
                .bind(param.is_optional)
                .bind(&param.value_data_type)
                .execute(&mut *tx.connection())
                .await?;
            }
        }

        Ok(())
    }

    pub async fn get(pool: &PgPool, serial: &str) -> Result<Factsheet> {
        let pp_row = sqlx::query("SELECT * FROM physical_parameters WHERE serial = $1")
            .bind(serial)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| RepoError::EntityNotFound(format!("factsheet for {serial}")))?;
        let physical_parameter = PhysicalParameter {
            serial: pp_row.try_get("serial")?,
            accel_max: pp_row.try_get("accel_max")?,
            decel_max: pp_row.try_get("decel_max")?,
            height_min: pp_row.try_get("height_min")?,
            height_max: pp_row.try_get("height_max")?,
            length: pp_row.try_get("length")?,
            width: pp_row.try_get("width")?,
            speed_min: pp_row.try_get("speed_min")?,
            speed_max: pp_row.try_get("speed_max")?,
        };

        let ts_row = sqlx::query("SELECT * FROM type_specifications WHERE serial = $1")
            .bind(serial)
            .fetch_one(pool)
            .await?;
        let type_specification = TypeSpecification {
            serial: ts_row.try_get("serial")?,
            agv_class: ts_row.try_get("agv_class")?,
            kinematics: ts_row.try_get("kinematics")?,
            localization_types: ts_row.try_get("localization_types")?,
            navigation_types: ts_row.try_get("navigation_types")?,
            max_load_mass: ts_row.try_get("max_load_mass")?,
            series_name: ts_row.try_get("series_name")?,
            series_description: ts_row.try_get("series_description")?,
        };

        let action_rows = sqlx::query("SELECT * FROM agv_actions WHERE serial = $1 ORDER BY id")
            .bind(serial)
            .fetch_all(pool)
            .await?;
        let mut actions = Vec::with_capacity(action_rows.len());
        for row in action_rows {
            let action = AgvAction {
                id: row.try_get::<i64, _>("id")? as u64,
                serial: row.try_get("serial")?,
                action_type: row.try_get("action_type")?,
                description: row.try_get("description")?,
                action_scopes: row.try_get("action_scopes")?,
                result_description: row.try_get("result_description")?,
            };
            let param_rows = sqlx::query("SELECT * FROM agv_action_parameters WHERE agv_action_id = $1 ORDER BY id")
                .bind(action.id as i64)
                .fetch_all(pool)
                .await?;
            let parameters = param_rows
                .into_iter()
                .map(|r| -> Result<AgvActionParameter> {
                    Ok(AgvActionParameter {
                        id: r.try_get::<i64, _>("id")? as u64,
                        agv_action_id: r.try_get::<i64, _>("agv_action_id")? as u64,
                        key: r.try_get("key")?,
                        description: r.try_get("description")?,
                        is_optional: r.try_get("is_optional")?,
                        value_data_type: r.try_get("value_data_type")?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            actions.push(AgvActionWithParameters { action, parameters });
        }

        Ok(Factsheet {
            physical_parameter,
            type_specification,
            actions,
        })
    }
}
