/// Tables in dependency order. `DROP_SCHEMA_SQL` drops them in reverse.
pub const SCHEMA_TABLES: [&str; 19] = [
    "roles",
    "users",
    "user_preferences",
    "indications",
    "medicine_manufacturers",
    "medicine_categories",
    "medicines",
    "medicine_shops",
    "shop_medicines",
    "medications",
    "reminders",
    "dose_logs",
    "prescriptions",
    "carts",
    "cart_items",
    "orders",
    "order_items",
    "payments",
    "notifications",
];

/// orders and prescriptions reference each other, so foreign key checks are
/// deferred to commit, by which point both tables are gone.
pub const DROP_SCHEMA_SQL: &str = r#"
PRAGMA defer_foreign_keys = ON;

DROP TABLE IF EXISTS notifications;
DROP TABLE IF EXISTS payments;
DROP TABLE IF EXISTS order_items;
DROP TABLE IF EXISTS orders;
DROP TABLE IF EXISTS cart_items;
DROP TABLE IF EXISTS carts;
DROP TABLE IF EXISTS prescriptions;
DROP TABLE IF EXISTS dose_logs;
DROP TABLE IF EXISTS reminders;
DROP TABLE IF EXISTS medications;
DROP TABLE IF EXISTS shop_medicines;
DROP TABLE IF EXISTS medicine_shops;
DROP TABLE IF EXISTS medicines;
DROP TABLE IF EXISTS medicine_categories;
DROP TABLE IF EXISTS medicine_manufacturers;
DROP TABLE IF EXISTS indications;
DROP TABLE IF EXISTS user_preferences;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS roles;
"#;

/// Base schema. Runs inside the caller's transaction, so it carries no
/// BEGIN/COMMIT of its own. Columns added later by column migrations
/// (medication reminders, user health) are deliberately absent here.
pub const CREATE_SCHEMA_SQL: &str = r#"
-- ========================================
-- Accounts
-- ========================================

CREATE TABLE IF NOT EXISTS roles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(20) NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(100) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    role_id INTEGER NOT NULL REFERENCES roles(id),
    phone VARCHAR(20),
    address TEXT,
    city VARCHAR(100),
    postal_code VARCHAR(20),
    profile_image_url VARCHAR(500),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    is_email_verified BOOLEAN NOT NULL DEFAULT FALSE,
    email_verification_token VARCHAR(255),
    password_reset_token VARCHAR(255),
    password_reset_token_expiry TIMESTAMP,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS user_preferences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    reminder_enabled BOOLEAN NOT NULL DEFAULT TRUE,
    reminder_sound BOOLEAN NOT NULL DEFAULT TRUE,
    reminder_vibration BOOLEAN NOT NULL DEFAULT TRUE,
    email_notifications BOOLEAN NOT NULL DEFAULT TRUE,
    push_notifications BOOLEAN NOT NULL DEFAULT TRUE,
    sms_notifications BOOLEAN NOT NULL DEFAULT FALSE,
    low_stock_alerts BOOLEAN NOT NULL DEFAULT TRUE,
    refill_reminders BOOLEAN NOT NULL DEFAULT TRUE,
    low_stock_threshold INTEGER NOT NULL DEFAULT 7,
    language VARCHAR(10) NOT NULL DEFAULT 'en',
    timezone VARCHAR(50) NOT NULL DEFAULT 'Asia/Dhaka',
    theme VARCHAR(20) NOT NULL DEFAULT 'system',
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ========================================
-- Catalog (loaded from indication.csv / medicine.csv)
-- ========================================

CREATE TABLE IF NOT EXISTS indications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    indication_id INTEGER UNIQUE,
    indication_name VARCHAR(255) NOT NULL,
    slug VARCHAR(255),
    generics_count INTEGER DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS medicine_manufacturers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(150) NOT NULL UNIQUE,
    slug VARCHAR(150),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS medicine_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL,
    slug VARCHAR(100) UNIQUE,
    description TEXT,
    icon_name VARCHAR(50),
    image_url VARCHAR(500),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS medicines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brand_id INTEGER,
    brand_name VARCHAR(200) NOT NULL,
    type VARCHAR(50),
    slug VARCHAR(255),
    dosage_form VARCHAR(100),
    generic_name VARCHAR(500),
    strength VARCHAR(100),
    manufacturer_id INTEGER REFERENCES medicine_manufacturers(id),
    unit_quantity VARCHAR(100),
    container_type VARCHAR(100),
    unit_price DECIMAL(12,2),
    pack_quantity DECIMAL(10,2),
    pack_price DECIMAL(12,2),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    view_count INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ========================================
-- Shops
-- ========================================

CREATE TABLE IF NOT EXISTS medicine_shops (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(150) NOT NULL,
    slug VARCHAR(150) UNIQUE,
    description TEXT,
    owner_id INTEGER NOT NULL REFERENCES users(id),
    email VARCHAR(100) NOT NULL,
    phone VARCHAR(20) NOT NULL,
    alternate_phone VARCHAR(20),
    address TEXT NOT NULL,
    city VARCHAR(100) NOT NULL,
    area VARCHAR(100),
    postal_code VARCHAR(20),
    country VARCHAR(100) NOT NULL DEFAULT 'Bangladesh',
    license_number VARCHAR(50) UNIQUE,
    tax_id VARCHAR(50),
    logo_url VARCHAR(500),
    banner_url VARCHAR(500),
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    total_products INTEGER NOT NULL DEFAULT 0,
    total_orders INTEGER NOT NULL DEFAULT 0,
    rating DECIMAL(3,2) DEFAULT 0.00,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS shop_medicines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    shop_id INTEGER NOT NULL REFERENCES medicine_shops(id) ON DELETE CASCADE,
    medicine_id INTEGER NOT NULL REFERENCES medicines(id),
    price DECIMAL(12,2) NOT NULL,
    discount_price DECIMAL(12,2),
    stock_quantity INTEGER NOT NULL DEFAULT 0,
    is_available BOOLEAN NOT NULL DEFAULT TRUE,
    is_featured BOOLEAN NOT NULL DEFAULT FALSE,
    batch_number VARCHAR(50),
    expiry_date DATE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (shop_id, medicine_id)
);

-- ========================================
-- Personal medications
-- ========================================

CREATE TABLE IF NOT EXISTS medications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    type VARCHAR(50) NOT NULL,
    dosage VARCHAR(50) NOT NULL,
    frequency INTEGER NOT NULL DEFAULT 1,
    inventory INTEGER NOT NULL DEFAULT 0,
    start_date DATE NOT NULL,
    end_date DATE,
    instructions TEXT,
    prescribed_by VARCHAR(100),
    image_url VARCHAR(500),
    status VARCHAR(20) NOT NULL DEFAULT 'ACTIVE',
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    medication_id INTEGER NOT NULL REFERENCES medications(id) ON DELETE CASCADE,
    reminder_type VARCHAR(20) NOT NULL DEFAULT 'FIXED_TIME',
    schedule_info VARCHAR(100),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS dose_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    medication_id INTEGER NOT NULL REFERENCES medications(id) ON DELETE CASCADE,
    scheduled_time TIMESTAMP NOT NULL,
    taken_time TIMESTAMP,
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
    notes TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ========================================
-- Orders
-- ========================================

-- order_id refers forward to orders; SQLite resolves foreign keys lazily
CREATE TABLE IF NOT EXISTS prescriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    order_id INTEGER REFERENCES orders(id),
    file_url VARCHAR(500) NOT NULL,
    file_type VARCHAR(50),
    file_size BIGINT,
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
    verified_by INTEGER REFERENCES users(id),
    verified_at TIMESTAMP,
    verification_notes TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS carts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    total_items INTEGER NOT NULL DEFAULT 0,
    subtotal DECIMAL(12,2) NOT NULL DEFAULT 0,
    discount DECIMAL(12,2) NOT NULL DEFAULT 0,
    total DECIMAL(12,2) NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS cart_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cart_id INTEGER NOT NULL REFERENCES carts(id) ON DELETE CASCADE,
    shop_medicine_id INTEGER NOT NULL REFERENCES shop_medicines(id),
    quantity INTEGER NOT NULL DEFAULT 1,
    price DECIMAL(12,2) NOT NULL,
    discount_price DECIMAL(12,2),
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (cart_id, shop_medicine_id)
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_number VARCHAR(50) NOT NULL UNIQUE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    shop_id INTEGER NOT NULL REFERENCES medicine_shops(id),
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
    subtotal DECIMAL(12,2) NOT NULL,
    shipping_cost DECIMAL(12,2) DEFAULT 0,
    discount DECIMAL(12,2) DEFAULT 0,
    total DECIMAL(12,2) NOT NULL,
    shipping_name VARCHAR(100),
    shipping_phone VARCHAR(20),
    shipping_address TEXT,
    shipping_city VARCHAR(100),
    shipping_area VARCHAR(100),
    shipping_postal_code VARCHAR(20),
    customer_notes TEXT,
    shop_notes TEXT,
    cancellation_reason TEXT,
    requires_prescription BOOLEAN NOT NULL DEFAULT FALSE,
    prescription_verified BOOLEAN NOT NULL DEFAULT FALSE,
    prescription_id INTEGER REFERENCES prescriptions(id),
    confirmed_at TIMESTAMP,
    processing_at TIMESTAMP,
    shipped_at TIMESTAMP,
    delivered_at TIMESTAMP,
    cancelled_at TIMESTAMP,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS order_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    shop_medicine_id INTEGER NOT NULL REFERENCES shop_medicines(id),
    medicine_name VARCHAR(150),
    medicine_strength VARCHAR(50),
    medicine_form VARCHAR(50),
    manufacturer_name VARCHAR(150),
    quantity INTEGER NOT NULL,
    unit_price DECIMAL(12,2) NOT NULL,
    discount_price DECIMAL(12,2),
    discount DECIMAL(12,2) DEFAULT 0,
    line_total DECIMAL(12,2) NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id INTEGER NOT NULL REFERENCES orders(id),
    transaction_id VARCHAR(100) UNIQUE,
    amount DECIMAL(12,2) NOT NULL,
    currency VARCHAR(10) NOT NULL DEFAULT 'BDT',
    payment_method VARCHAR(50),
    status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
    gateway_response TEXT,
    paid_at TIMESTAMP,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS notifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    type VARCHAR(50) NOT NULL,
    title VARCHAR(200) NOT NULL,
    message TEXT NOT NULL,
    reference_id VARCHAR(100),
    reference_type VARCHAR(50),
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    read_at TIMESTAMP,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ========================================
-- Indexes
-- ========================================

CREATE INDEX IF NOT EXISTS idx_users_email ON users (email);
CREATE INDEX IF NOT EXISTS idx_users_role ON users (role_id);
CREATE INDEX IF NOT EXISTS idx_medicines_brand_name ON medicines (brand_name);
CREATE INDEX IF NOT EXISTS idx_medicines_generic_name ON medicines (generic_name);
CREATE INDEX IF NOT EXISTS idx_medicines_slug ON medicines (slug);
CREATE INDEX IF NOT EXISTS idx_medicines_brand_id ON medicines (brand_id);
CREATE INDEX IF NOT EXISTS idx_medicines_manufacturer ON medicines (manufacturer_id);
CREATE INDEX IF NOT EXISTS idx_indications_name ON indications (indication_name);
CREATE INDEX IF NOT EXISTS idx_indications_slug ON indications (slug);
CREATE INDEX IF NOT EXISTS idx_shop_medicines_shop ON shop_medicines (shop_id);
CREATE INDEX IF NOT EXISTS idx_shop_medicines_medicine ON shop_medicines (medicine_id);
CREATE INDEX IF NOT EXISTS idx_medications_user ON medications (user_id);
CREATE INDEX IF NOT EXISTS idx_dose_logs_medication ON dose_logs (medication_id);
CREATE INDEX IF NOT EXISTS idx_dose_logs_scheduled ON dose_logs (scheduled_time);
CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id);
CREATE INDEX IF NOT EXISTS idx_orders_shop ON orders (shop_id);
CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status);
CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications (user_id);
CREATE INDEX IF NOT EXISTS idx_notifications_unread ON notifications (user_id, is_read);
"#;

/// Fixed reference rows. Every insert is guarded by a UNIQUE natural key so
/// re-running the seed is a no-op.
pub const SEED_ROLES_SQL: &str =
    "INSERT OR IGNORE INTO roles (name) VALUES ('ADMIN'), ('USER'), ('SHOP_OWNER')";

pub const SEED_CATEGORIES_SQL: &str = r#"
INSERT OR IGNORE INTO medicine_categories (name, slug, description, icon_name, is_active, sort_order) VALUES
    ('Allopathic', 'allopathic', 'Modern/Western medicines', 'pill', TRUE, 1),
    ('Herbal', 'herbal', 'Herbal and natural medicines', 'leaf', TRUE, 2),
    ('Ayurvedic', 'ayurvedic', 'Traditional Ayurvedic medicines', 'flower', TRUE, 3),
    ('Homeopathic', 'homeopathic', 'Homeopathic medicines', 'droplet', TRUE, 4),
    ('Unani', 'unani', 'Unani medicines', 'moon', TRUE, 5)
"#;

/// The admin account takes its values from configuration; the role is looked
/// up by name so the row survives reseeding into a database with other roles.
pub const SEED_ADMIN_SQL: &str = r#"
INSERT OR IGNORE INTO users (name, email, password, role_id, is_active, is_email_verified)
SELECT ?1, ?2, ?3, id, TRUE, TRUE FROM roles WHERE name = 'ADMIN'
"#;
