use validator::Validate;

use crate::{
    entities::{
        auth::{AuthContext, Capability},
        brand_kit::{
            copy_name, BrandKit, BrandKitChanges, BrandKitDefaults, BrandKitExport, BrandKitExportResponse,
            BrandKitInsert, ImportBrandKitRequest, NewBrandKitRequest, UpdateBrandKitRequest,
        },
    },
    errors::{AppError, FieldError},
    repositories::brand_kit::BrandKitRepository,
};

pub struct BrandKitHandler<B>
where
    B: BrandKitRepository,
{
    pub brand_kit_repo: B,
}

impl<B> BrandKitHandler<B>
where
    B: BrandKitRepository,
{
    pub fn new(brand_kit_repo: B) -> Self {
        BrandKitHandler { brand_kit_repo }
    }

    async fn load_visible(&self, auth: &AuthContext, id: i64) -> Result<BrandKit, AppError> {
        match self.brand_kit_repo.get_brand_kit(id).await? {
            Some(kit) if auth.can_access_owned_by(kit.user_id) => Ok(kit),
            _ => Err(AppError::NotFound("Brand kit not found".into())),
        }
    }

    pub async fn list_brand_kits(&self, auth: &AuthContext) -> Result<Vec<BrandKit>, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        self.brand_kit_repo.list_brand_kits(auth.user_id).await
    }

    pub async fn get_brand_kit(&self, auth: &AuthContext, id: i64) -> Result<BrandKit, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        self.load_visible(auth, id).await
    }

    pub async fn create_brand_kit(&self, auth: &AuthContext, request: NewBrandKitRequest) -> Result<BrandKit, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        let request = request.sanitized();
        request.validate()?;

        let kit = self
            .brand_kit_repo
            .create_brand_kit(&request.into_insert(auth.user_id))
            .await?;
        tracing::info!(user_id = auth.user_id, brand_kit_id = kit.id, "Brand kit created");
        Ok(kit)
    }

    pub async fn update_brand_kit(
        &self,
        auth: &AuthContext,
        id: i64,
        request: UpdateBrandKitRequest,
    ) -> Result<BrandKit, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        let request = request.sanitized();
        request.validate()?;

        let changes = BrandKitChanges::from(request);
        if changes.is_empty() {
            return Err(AppError::ValidationError(vec![FieldError::new(
                "body",
                "At least one of name, colors, fonts or style_guidelines is required",
            )]));
        }

        self.load_visible(auth, id).await?;
        self.brand_kit_repo.update_brand_kit(id, &changes).await
    }

    pub async fn delete_brand_kit(&self, auth: &AuthContext, id: i64) -> Result<(), AppError> {
        auth.require(Capability::ManageBrandKits)?;
        self.load_visible(auth, id).await?;
        self.brand_kit_repo.delete_brand_kit(id).await?;
        tracing::info!(user_id = auth.user_id, brand_kit_id = id, "Brand kit deleted");
        Ok(())
    }

    /// The copy belongs to the caller, whoever owned the original.
    pub async fn duplicate_brand_kit(&self, auth: &AuthContext, id: i64) -> Result<BrandKit, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        let original = self.load_visible(auth, id).await?;

        let insert = BrandKitInsert {
            user_id: auth.user_id,
            name: copy_name(&original.name),
            colors: original.colors,
            fonts: original.fonts,
            style_guidelines: original.style_guidelines,
        };
        self.brand_kit_repo.create_brand_kit(&insert).await
    }

    pub async fn export_brand_kit(&self, auth: &AuthContext, id: i64) -> Result<BrandKitExportResponse, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        let kit = self.load_visible(auth, id).await?;

        Ok(BrandKitExportResponse {
            success: true,
            export_data: BrandKitExport::from_kit(&kit, &auth.display_name),
        })
    }

    pub async fn import_brand_kit(&self, auth: &AuthContext, request: ImportBrandKitRequest) -> Result<BrandKit, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        let data = request.brand_kit_data;

        let Some(name) = data.name.filter(|n| !n.trim().is_empty()) else {
            return Err(AppError::ValidationError(vec![FieldError::new(
                "name",
                "Imported brand kit must have a name",
            )]));
        };

        self.create_brand_kit(
            auth,
            NewBrandKitRequest {
                name,
                colors: data.colors,
                fonts: data.fonts,
                style_guidelines: data.style_guidelines,
            },
        )
        .await
    }

    pub fn defaults(&self, auth: &AuthContext) -> Result<BrandKitDefaults, AppError> {
        auth.require(Capability::ManageBrandKits)?;
        Ok(BrandKitDefaults::default())
    }
}
