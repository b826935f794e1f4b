// src/services/auth.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    common::{
        error::AppError,
        security::{CredentialHasher, TokenIssuer},
    },
    db::Store,
    domain::{Actor, AuditAction, AuditEvent, EntityType, Outcome},
    models::{
        auth::{
            AuthResponse, LoginUserPayload, MeResponse, NewUser, RegisterConsumerPayload,
            RegisterStaffPayload, RegisterSupplierPayload, Role, User, UserSummary,
        },
        supplier::NewSupplier,
    },
};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self { store, hasher, tokens }
    }

    /// Cria o fornecedor e o seu OWNER numa única transação.
    pub async fn register_supplier(
        &self,
        payload: RegisterSupplierPayload,
    ) -> Result<Outcome<AuthResponse>, AppError> {
        payload.validate()?;

        // 1. Hashing (fora da transação, não toca no banco)
        let password_hash = self.hasher.hash(&payload.password).await?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.store.begin().await?;

        // 2. Fornecedor
        let supplier = tx
            .insert_supplier(NewSupplier {
                company_name: payload.company_name,
                address: payload.address,
                phone: payload.phone,
            })
            .await?;

        // 3. Dono. Se o e-mail já existir, o fornecedor acima é desfeito no drop.
        let owner = tx
            .insert_user(NewUser {
                email: payload.owner_email,
                password_hash,
                full_name: payload.owner_full_name,
                role: Role::Owner,
                supplier_id: Some(supplier.id),
                restaurant_name: None,
            })
            .await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("🏪 Fornecedor {} registrado (dono: {}).", supplier.id, owner.id);

        let token = self.tokens.issue(&owner)?;
        Ok(Outcome::single(
            AuthResponse::bearer(token),
            AuditEvent::new(
                owner.id,
                AuditAction::SupplierRegistered,
                EntityType::Supplier,
                supplier.id,
            ),
        ))
    }

    pub async fn register_consumer(
        &self,
        payload: RegisterConsumerPayload,
    ) -> Result<Outcome<AuthResponse>, AppError> {
        payload.validate()?;

        let password_hash = self.hasher.hash(&payload.password).await?;

        let mut tx = self.store.begin().await?;
        let consumer = tx
            .insert_user(NewUser {
                email: payload.email,
                password_hash,
                full_name: payload.full_name,
                role: Role::Consumer,
                supplier_id: None,
                restaurant_name: Some(payload.restaurant_name),
            })
            .await?;
        tx.commit().await?;

        tracing::info!("🍽️ Consumidor {} registrado.", consumer.id);

        let token = self.tokens.issue(&consumer)?;
        Ok(Outcome::single(
            AuthResponse::bearer(token),
            AuditEvent::new(
                consumer.id,
                AuditAction::ConsumerRegistered,
                EntityType::User,
                consumer.id,
            ),
        ))
    }

    /// OWNER cadastra MANAGER ou SALES; MANAGER cadastra SALES. Sempre no próprio fornecedor.
    pub async fn register_staff(
        &self,
        actor: &Actor,
        payload: RegisterStaffPayload,
    ) -> Result<Outcome<UserSummary>, AppError> {
        let supplier_id = actor.require_admin()?;
        payload.validate()?;

        match (actor.role, payload.role) {
            (_, Role::Owner | Role::Consumer) => {
                return Err(AppError::ValidationFailed(
                    "Só é possível cadastrar usuários MANAGER ou SALES.".into(),
                ));
            }
            (Role::Owner, _) | (Role::Manager, Role::Sales) => {}
            _ => {
                return Err(AppError::Forbidden(
                    "Gerentes só podem cadastrar usuários de vendas.".into(),
                ));
            }
        }

        let password_hash = self.hasher.hash(&payload.password).await?;

        let mut tx = self.store.begin().await?;
        let staff = tx
            .insert_user(NewUser {
                email: payload.email,
                password_hash,
                full_name: payload.full_name,
                role: payload.role,
                supplier_id: Some(supplier_id),
                restaurant_name: None,
            })
            .await?;
        tx.commit().await?;

        tracing::info!(
            "👤 Usuário {} ({}) adicionado ao fornecedor {} por {}.",
            staff.id,
            staff.role,
            supplier_id,
            actor.user_id
        );

        Ok(Outcome::single(
            UserSummary::from(&staff),
            AuditEvent::new(actor.user_id, AuditAction::StaffRegistered, EntityType::User, staff.id),
        ))
    }

    // E-mail desconhecido e senha errada dão o mesmo erro
    pub async fn login(&self, payload: LoginUserPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let user = {
            let mut tx = self.store.begin().await?;
            tx.find_user_by_email(&payload.email)
                .await?
                .ok_or(AppError::InvalidCredentials)?
        };

        let is_password_valid = self.hasher.verify(&payload.password, &user.password_hash).await?;
        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        Ok(AuthResponse::bearer(self.tokens.issue(&user)?))
    }

    /// Valida o token e carrega o usuário atual do banco.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify(token)?;
        let user_id = claims.user_id().ok_or(AppError::InvalidToken)?;

        let mut tx = self.store.begin().await?;
        tx.find_user(user_id).await?.ok_or(AppError::InvalidToken)
    }

    pub async fn me(&self, user: &User) -> Result<MeResponse, AppError> {
        let supplier_info = match user.supplier_id {
            Some(id) => {
                let mut tx = self.store.begin().await?;
                tx.find_supplier(id).await?
            }
            None => None,
        };

        Ok(MeResponse {
            user: UserSummary::from(user),
            supplier_info,
        })
    }
}
