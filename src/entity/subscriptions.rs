use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub cadence: String,
    pub package_type: String,
    pub status: String,
    pub price: Decimal,
    pub premade_package_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::premade_packages::Entity",
        from = "Column::PremadePackageId",
        to = "super::premade_packages::Column::Id"
    )]
    PremadePackages,
    #[sea_orm(has_one = "super::delivery_details::Entity")]
    DeliveryDetails,
    #[sea_orm(has_many = "super::subscription_items::Entity")]
    SubscriptionItems,
    #[sea_orm(has_many = "super::subscription_emails::Entity")]
    SubscriptionEmails,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::premade_packages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PremadePackages.def()
    }
}

impl Related<super::delivery_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryDetails.def()
    }
}

impl Related<super::subscription_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionItems.def()
    }
}

impl Related<super::subscription_emails::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriptionEmails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
